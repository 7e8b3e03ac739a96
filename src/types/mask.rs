use serde::{Deserialize, Serialize};

use super::{CargoId, CompanyId};

/// Set of cargo types contributing to the overlay.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CargoMask(pub u64);

/// Set of companies whose stations are shown.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyMask(pub u16);

impl CargoMask {
    /// Every cargo slot.
    pub const fn all() -> Self {
        CargoMask(u64::MAX)
    }

    /// No cargo at all.
    pub const fn none() -> Self {
        CargoMask(0)
    }

    /// True if `cargo` is selected.
    pub fn contains(self, cargo: CargoId) -> bool {
        cargo.0 < CargoId::MAX && self.0 & (1u64 << cargo.0) != 0
    }

    /// Returns the mask with `cargo` added.
    pub fn with(self, cargo: CargoId) -> Self {
        if cargo.0 >= CargoId::MAX {
            return self;
        }
        CargoMask(self.0 | (1u64 << cargo.0))
    }

    /// True if nothing is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Selected cargo ids in ascending order.
    pub fn iter(self) -> impl Iterator<Item = CargoId> {
        let bits = self.0;
        (0..CargoId::MAX)
            .filter(move |bit| bits & (1u64 << bit) != 0)
            .map(CargoId)
    }
}

impl CompanyMask {
    /// Every company slot.
    pub const fn all() -> Self {
        CompanyMask((1u16 << CompanyId::MAX) - 1)
    }

    /// No company at all.
    pub const fn none() -> Self {
        CompanyMask(0)
    }

    /// True if `company` is selected.
    pub fn contains(self, company: CompanyId) -> bool {
        company.0 < CompanyId::MAX && self.0 & (1u16 << company.0) != 0
    }

    /// Returns the mask with `company` added.
    pub fn with(self, company: CompanyId) -> Self {
        if company.0 >= CompanyId::MAX {
            return self;
        }
        CompanyMask(self.0 | (1u16 << company.0))
    }

    /// True if nothing is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cargo_mask_iterates_in_ascending_order() {
        let mask = CargoMask::none()
            .with(CargoId(9))
            .with(CargoId(0))
            .with(CargoId(63));
        let ids: Vec<u8> = mask.iter().map(|c| c.0).collect();
        assert_eq!(ids, vec![0, 9, 63]);
        assert!(!mask.contains(CargoId(1)));
        assert!(!mask.contains(CargoId(64)));
    }

    #[test]
    fn company_mask_all_covers_every_company() {
        let all = CompanyMask::all();
        for c in 0..CompanyId::MAX {
            assert!(all.contains(CompanyId(c)));
        }
        assert!(!all.contains(CompanyId(CompanyId::MAX)));
        assert!(CompanyMask::none().is_empty());
    }
}
