//! Structuring elements for binary morphology

use burnscar_core::{Error, Result};

/// Shape of the neighbourhood a morphological operator looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Square of given radius (side = 2*radius + 1)
    Square(usize),
    /// Plus-shaped element of given radius
    Cross(usize),
    /// Disk of given radius
    Disk(usize),
}

impl Default for StructuringElement {
    /// The 3x3 cross, i.e. 4-connected growth by one cell
    fn default() -> Self {
        StructuringElement::Cross(1)
    }
}

impl StructuringElement {
    pub fn validate(&self) -> Result<()> {
        if self.radius() == 0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: "0".to_string(),
                reason: "structuring element radius must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Square(r)
            | StructuringElement::Cross(r)
            | StructuringElement::Disk(r) => *r,
        }
    }

    /// `(dr, dc)` offsets of every active cell, centre included
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        let mut offsets = Vec::new();
        for dr in -r..=r {
            for dc in -r..=r {
                let active = match self {
                    StructuringElement::Square(_) => true,
                    StructuringElement::Cross(_) => dr == 0 || dc == 0,
                    StructuringElement::Disk(_) => dr * dr + dc * dc <= r * r,
                };
                if active {
                    offsets.push((dr, dc));
                }
            }
        }
        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_offsets() {
        let offsets = StructuringElement::Square(1).offsets();
        assert_eq!(offsets.len(), 9);
        assert!(offsets.contains(&(-1, -1)));
    }

    #[test]
    fn test_cross_offsets() {
        let offsets = StructuringElement::Cross(1).offsets();
        assert_eq!(offsets.len(), 5);
        assert!(offsets.contains(&(0, 0)));
        assert!(!offsets.contains(&(1, 1)));
    }

    #[test]
    fn test_disk_offsets() {
        assert_eq!(StructuringElement::Disk(2).offsets().len(), 13);
    }

    #[test]
    fn test_zero_radius_invalid() {
        assert!(StructuringElement::Square(0).validate().is_err());
        assert!(StructuringElement::default().validate().is_ok());
    }
}
