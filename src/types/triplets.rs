use super::triplet::Triplet;
use crate::TripletErr;
use std::{fmt, str::FromStr};

/// Targets built when no `--target` is given: (os, arch, variant)
pub const DEFAULT_TARGETS: &[(&str, &str, &str)] = &[
    ("windows", "amd64", ""),
    ("linux", "amd64", ""),
    ("linux", "amd64", "musl"),
    ("linux", "arm", "6"), // (e.g. Pi A, A+, B, B+, Zero)
    ("linux", "arm", "7"), // (e.g. Pi 2, 3) (32bit)
    ("linux", "arm64", ""), // (e.g. Pi 3, 4) - no GOARM
];

/// Ordered list of targets. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triplets(pub Vec<Triplet>);

impl Triplets {
    /// The full default target matrix
    pub fn defaults() -> Self {
        Self(
            DEFAULT_TARGETS
                .iter()
                .map(|&(os, arch, variant)| Triplet::new(os, arch, variant))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triplet> {
        self.0.iter()
    }
}

impl FromStr for Triplets {
    type Err = TripletErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::parse::<Triplet>)
            .collect::<Result<Vec<_>, _>>()
            .map(Triplets)
    }
}

/// Comma joined canonical triplets, parses back into an equal set
impl fmt::Display for Triplets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&t.canonical())?;
        }
        Ok(())
    }
}

impl FromIterator<Triplet> for Triplets {
    fn from_iter<I: IntoIterator<Item = Triplet>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Triplets {
    type Item = &'a Triplet;
    type IntoIter = std::slice::Iter<'a, Triplet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::triplet::{Arch, Variant};

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        let set: Triplets = "linux-arm-7,windows-amd64-,linux-arm-7".parse().unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.0[0], set.0[2]);
        assert_eq!(set.0[1].arch, Arch::Amd64);
        assert_eq!(set.to_string(), "linux-arm-7,windows-amd64-,linux-arm-7");
    }

    #[test]
    fn test_parse_error_aborts_whole_list() {
        let err = "linux-arm-7,linux,linux-amd64".parse::<Triplets>();
        // the first bad entry is reported, no partial set
        assert_eq!(err, Err(TripletErr::NoValidTriplet("linux".into())));

        let set: Triplets = "linux-amd64-musl".parse().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.0[0].variant, Variant::Musl);
    }

    #[test]
    fn test_defaults_display() {
        assert_eq!(
            Triplets::defaults().to_string(),
            "windows-amd64-,linux-amd64-,linux-amd64-musl,linux-arm-6,linux-arm-7,linux-arm64-"
        );
    }

    #[test]
    fn test_display_parses_back() {
        let defaults = Triplets::defaults();
        assert_eq!(defaults.to_string().parse::<Triplets>(), Ok(defaults));
    }
}
