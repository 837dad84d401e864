//! Interpretation classes for shape, circularity and hypsometric stage.

use std::fmt;

/// Basin shape from the elongation ratio Re
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeClass {
    Circular,
    Oval,
    LessElongated,
    Elongated,
    MoreElongated,
    Unknown,
}

impl ShapeClass {
    pub fn from_elongation(re: Option<f64>) -> Self {
        match re {
            None => Self::Unknown,
            Some(v) if v >= 0.9 => Self::Circular,
            Some(v) if v >= 0.8 => Self::Oval,
            Some(v) if v >= 0.7 => Self::LessElongated,
            Some(v) if v >= 0.5 => Self::Elongated,
            Some(_) => Self::MoreElongated,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Circular => "Circular",
            Self::Oval => "Oval",
            Self::LessElongated => "Less Elongated",
            Self::Elongated => "Elongated",
            Self::MoreElongated => "More Elongated",
            Self::Unknown => "Unknown",
        }
    }
}

/// Circularity stage from Rc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircularityClass {
    CircularYoung,
    Intermediate,
    ElongatedOld,
    Unknown,
}

impl CircularityClass {
    pub fn from_circularity(rc: Option<f64>) -> Self {
        match rc {
            None => Self::Unknown,
            Some(v) if v >= 0.75 => Self::CircularYoung,
            Some(v) if v >= 0.5 => Self::Intermediate,
            Some(_) => Self::ElongatedOld,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CircularYoung => "Circular/Young",
            Self::Intermediate => "Intermediate",
            Self::ElongatedOld => "Elongated/Old",
            Self::Unknown => "Unknown",
        }
    }
}

/// Erosional stage from the hypsometric integral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HypsometricStage {
    Monadnock,
    Mature,
    Peneplain,
    Unknown,
}

impl HypsometricStage {
    pub fn from_integral(hi: Option<f64>) -> Self {
        match hi {
            None => Self::Unknown,
            Some(v) if v > 0.6 => Self::Monadnock,
            Some(v) if v > 0.35 => Self::Mature,
            Some(_) => Self::Peneplain,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Monadnock => "Monadnock (Young/Convex)",
            Self::Mature => "Mature (Equilibrium)",
            Self::Peneplain => "Peneplain (Old/Concave)",
            Self::Unknown => "Unknown",
        }
    }
}

macro_rules! impl_display_label {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

impl_display_label!(ShapeClass, CircularityClass, HypsometricStage);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_thresholds() {
        assert_eq!(ShapeClass::from_elongation(Some(0.95)), ShapeClass::Circular);
        assert_eq!(ShapeClass::from_elongation(Some(0.9)), ShapeClass::Circular);
        assert_eq!(ShapeClass::from_elongation(Some(0.85)), ShapeClass::Oval);
        assert_eq!(ShapeClass::from_elongation(Some(0.7)), ShapeClass::LessElongated);
        assert_eq!(ShapeClass::from_elongation(Some(0.6)), ShapeClass::Elongated);
        assert_eq!(ShapeClass::from_elongation(Some(0.2)), ShapeClass::MoreElongated);
        assert_eq!(ShapeClass::from_elongation(None).to_string(), "Unknown");
    }

    #[test]
    fn test_circularity_thresholds() {
        assert_eq!(CircularityClass::from_circularity(Some(0.75)).label(), "Circular/Young");
        assert_eq!(CircularityClass::from_circularity(Some(0.5)).label(), "Intermediate");
        assert_eq!(CircularityClass::from_circularity(Some(0.49)).label(), "Elongated/Old");
    }

    #[test]
    fn test_hypsometric_stage_is_strict() {
        assert_eq!(HypsometricStage::from_integral(Some(0.6)), HypsometricStage::Mature);
        assert_eq!(HypsometricStage::from_integral(Some(0.61)), HypsometricStage::Monadnock);
        assert_eq!(HypsometricStage::from_integral(Some(0.35)), HypsometricStage::Peneplain);
    }
}
