//! Numeric corrections applied around the backend transformation.
//!
//! A [`CustomTransformation`] is a chain of nodes. The *forward* direction converts coordinates as the user sees them
//! into the coordinates the backend expects and runs from the outermost node to the innermost one. The *inverse*
//! direction runs the other way round.
//!
//! A chain can be given in the parameter text of a coordinate system with the `+custom=<definition>` directive, where
//! `<definition>` is one of:
//!
//! * `shiftscale:dx,dy,sx,sy` or `shiftscale:dx,dy,sx,sy,dz,sz` - forward is `(v + d) * s` per axis,
//! * `dms:factor` - values divided by `factor` are sexagesimal degrees written as `DDD.MMSSsss`; forward produces
//!   decimal degrees.

use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

/// Keyword of the custom transformation directive in parameter text.
pub const CUSTOM_KEYWORD: &str = "+custom";

/// Kind of a single node in a [`CustomTransformation`] chain.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomKind {
    /// Affine per-axis correction: `(v + shift) * scale` in the forward direction.
    ShiftScale {
        /// Shift of x, y and z.
        shift: [f64; 3],
        /// Scale of x, y and z.
        scale: [f64; 3],
    },
    /// Sexagesimal representation of angles. Only x and y are converted.
    Sexagesimal {
        /// Multiplier of the packed `DDD.MMSSsss` value.
        factor: f64,
    },
}

impl CustomKind {
    fn forward(&self, x: &mut f64, y: &mut f64, z: Option<&mut f64>) {
        match self {
            CustomKind::ShiftScale { shift, scale } => {
                *x = (*x + shift[0]) * scale[0];
                *y = (*y + shift[1]) * scale[1];
                if let Some(z) = z {
                    *z = (*z + shift[2]) * scale[2];
                }
            }
            CustomKind::Sexagesimal { factor } => {
                *x = sexagesimal_to_decimal(*x / factor);
                *y = sexagesimal_to_decimal(*y / factor);
            }
        }
    }

    fn inverse(&self, x: &mut f64, y: &mut f64, z: Option<&mut f64>) {
        match self {
            CustomKind::ShiftScale { shift, scale } => {
                *x = *x / scale[0] - shift[0];
                *y = *y / scale[1] - shift[1];
                if let Some(z) = z {
                    *z = *z / scale[2] - shift[2];
                }
            }
            CustomKind::Sexagesimal { factor } => {
                *x = decimal_to_sexagesimal(*x) * factor;
                *y = decimal_to_sexagesimal(*y) * factor;
            }
        }
    }

    fn parse(spec: &str) -> Option<Self> {
        let (name, args) = spec.split_once(':').unwrap_or((spec, ""));
        let values = args
            .split(',')
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;

        match (name.to_ascii_lowercase().as_str(), values.as_slice()) {
            ("shiftscale", &[dx, dy, sx, sy]) => Some(Self::ShiftScale {
                shift: [dx, dy, 0.0],
                scale: [sx, sy, 1.0],
            }),
            ("shiftscale", &[dx, dy, sx, sy, dz, sz]) => Some(Self::ShiftScale {
                shift: [dx, dy, dz],
                scale: [sx, sy, sz],
            }),
            ("dms", &[]) => Some(Self::Sexagesimal { factor: 1.0 }),
            ("dms", &[factor]) if factor != 0.0 => Some(Self::Sexagesimal { factor }),
            _ => None,
        }
    }
}

impl Display for CustomKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomKind::ShiftScale { shift, scale } if shift[2] == 0.0 && scale[2] == 1.0 => {
                write!(f, "shiftscale:{},{},{},{}", shift[0], shift[1], scale[0], scale[1])
            }
            CustomKind::ShiftScale { shift, scale } => write!(
                f,
                "shiftscale:{},{},{},{},{},{}",
                shift[0], shift[1], scale[0], scale[1], shift[2], scale[2]
            ),
            CustomKind::Sexagesimal { factor } => write!(f, "dms:{factor}"),
        }
    }
}

/// Chain of numeric corrections. The node itself is the outermost step, `inner_most` is applied closer to the
/// backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomTransformation {
    kind: CustomKind,
    inner_most: Option<Box<CustomTransformation>>,
}

impl CustomTransformation {
    /// Creates a chain with a single node.
    pub fn new(kind: CustomKind) -> Self {
        Self {
            kind,
            inner_most: None,
        }
    }

    /// Affine correction of x and y. Z is left unchanged.
    pub fn shift_scale(shift_x: f64, shift_y: f64, scale_x: f64, scale_y: f64) -> Self {
        Self::new(CustomKind::ShiftScale {
            shift: [shift_x, shift_y, 0.0],
            scale: [scale_x, scale_y, 1.0],
        })
    }

    /// Conversion of degrees (user side) to radians (backend side).
    pub fn degrees_to_radians() -> Self {
        Self::shift_scale(0.0, 0.0, PI / 180.0, PI / 180.0)
    }

    /// Sexagesimal degrees multiplied by `factor` (user side) to decimal degrees (backend side).
    pub fn sexagesimal(factor: f64) -> Self {
        Self::new(CustomKind::Sexagesimal { factor })
    }

    /// Kind of the outermost node.
    pub fn kind(&self) -> &CustomKind {
        &self.kind
    }

    /// Parameter text directive (`+custom=<definition>`) of the outermost node.
    pub fn to_directive(&self) -> String {
        format!("{CUSTOM_KEYWORD}={}", self.kind)
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    /// A chain always has at least one node.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Appends `node` (with its own inner nodes) at the innermost position.
    pub fn append_innermost(&mut self, node: CustomTransformation) {
        match &mut self.inner_most {
            Some(inner) => inner.append_innermost(node),
            None => self.inner_most = Some(Box::new(node)),
        }
    }

    /// Returns the chain extended with `node` at the innermost position.
    pub fn with_innermost(mut self, node: CustomTransformation) -> Self {
        self.append_innermost(node);
        self
    }

    /// Iterates the node kinds from the outermost to the innermost.
    pub fn nodes(&self) -> impl Iterator<Item = &CustomKind> {
        std::iter::successors(Some(self), |node| node.inner_most.as_deref()).map(|node| &node.kind)
    }

    /// Converts a point from user coordinates to backend coordinates.
    pub fn forward(&self, mut x: f64, mut y: f64, mut z: Option<f64>) -> (f64, f64, Option<f64>) {
        for kind in self.nodes() {
            kind.forward(&mut x, &mut y, z.as_mut());
        }
        (x, y, z)
    }

    /// Converts a point from backend coordinates to user coordinates.
    pub fn inverse(&self, mut x: f64, mut y: f64, mut z: Option<f64>) -> (f64, f64, Option<f64>) {
        let nodes: Vec<_> = self.nodes().collect();
        for kind in nodes.into_iter().rev() {
            kind.inverse(&mut x, &mut y, z.as_mut());
        }
        (x, y, z)
    }

    /// Applies [`forward`](Self::forward) to every point of the buffers.
    pub fn forward_slices(&self, x: &mut [f64], y: &mut [f64], mut z: Option<&mut [f64]>) {
        for kind in self.nodes() {
            for i in 0..x.len() {
                kind.forward(&mut x[i], &mut y[i], z.as_deref_mut().map(|z| &mut z[i]));
            }
        }
    }

    /// Applies [`inverse`](Self::inverse) to every point of the buffers.
    pub fn inverse_slices(&self, x: &mut [f64], y: &mut [f64], mut z: Option<&mut [f64]>) {
        let nodes: Vec<_> = self.nodes().collect();
        for kind in nodes.into_iter().rev() {
            for i in 0..x.len() {
                kind.inverse(&mut x[i], &mut y[i], z.as_deref_mut().map(|z| &mut z[i]));
            }
        }
    }

    /// Extracts a `<keyword>=<definition>` directive from parameter text.
    ///
    /// Returns `None` if the text has no such directive or the definition is not recognized. A recognized directive is
    /// removed from `text` if `remove_from_text` is set, so that the rest can be passed to the backend.
    pub fn parse(text: &mut String, keyword: &str, remove_from_text: bool) -> Option<Self> {
        let prefix = format!("{keyword}=");
        let mut offset = 0;
        let (start, end) = loop {
            let start = offset + text[offset..].find(&prefix)?;
            let at_boundary = text[..start]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace);
            let end = text[start..]
                .find(char::is_whitespace)
                .map_or(text.len(), |len| start + len);
            if at_boundary {
                break (start, end);
            }
            offset = end;
        };

        let spec = &text[start + prefix.len()..end];
        let Some(kind) = CustomKind::parse(spec) else {
            log::warn!("Unrecognized custom transformation '{spec}'");
            return None;
        };

        if remove_from_text {
            let rest = format!("{} {}", &text[..start], &text[end..]);
            *text = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        }

        Some(Self::new(kind))
    }
}

fn sexagesimal_to_decimal(value: f64) -> f64 {
    let sign = value.signum();
    // DDDMMSSsss, in thousandths of a second
    let packed = (value.abs() * 1e7).round();
    let degrees = (packed / 1e7).floor();
    let minutes = ((packed / 1e5).floor()) % 100.0;
    let seconds = (packed % 1e5) / 1e3;

    sign * (degrees + minutes / 60.0 + seconds / 3600.0)
}

fn decimal_to_sexagesimal(value: f64) -> f64 {
    let sign = value.signum();
    let total_seconds = (value.abs() * 3600.0 * 1e3).round() / 1e3;
    let degrees = (total_seconds / 3600.0).floor();
    let minutes = ((total_seconds - degrees * 3600.0) / 60.0).floor();
    let seconds = total_seconds - degrees * 3600.0 - minutes * 60.0;

    sign * (degrees + minutes / 100.0 + seconds / 10_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_directive_list() {
        let mut text = "+proj=longlat +datum=WGS84".to_string();
        assert!(CustomTransformation::parse(&mut text, CUSTOM_KEYWORD, true).is_none());
        assert_eq!(text, "+proj=longlat +datum=WGS84");
    }

    #[test]
    fn parse_and_remove_directive() {
        let mut text = "+proj=longlat +custom=shiftscale:0,0,0.00001,0.00001 +datum=WGS84".to_string();
        let chain = CustomTransformation::parse(&mut text, CUSTOM_KEYWORD, true).expect("directive");

        assert_eq!(text, "+proj=longlat +datum=WGS84");
        assert_eq!(chain, CustomTransformation::shift_scale(0.0, 0.0, 0.00001, 0.00001));
    }

    #[test]
    fn parse_keeps_text_when_asked() {
        let mut text = "+proj=longlat +custom=dms:100000".to_string();
        let chain = CustomTransformation::parse(&mut text, CUSTOM_KEYWORD, false).expect("directive");

        assert_eq!(text, "+proj=longlat +custom=dms:100000");
        assert_eq!(chain.kind(), &CustomKind::Sexagesimal { factor: 100_000.0 });
    }

    #[test]
    fn parse_ignores_keyword_inside_other_token() {
        let mut text = "+proj=longlat +my+custom=dms:1".to_string();
        assert!(CustomTransformation::parse(&mut text, CUSTOM_KEYWORD, true).is_none());
    }

    #[test]
    fn unrecognized_spec_is_left_in_place() {
        let mut text = "+proj=longlat +custom=rotate:15".to_string();
        assert!(CustomTransformation::parse(&mut text, CUSTOM_KEYWORD, true).is_none());
        assert_eq!(text, "+proj=longlat +custom=rotate:15");
    }

    #[test]
    fn directive_display_parses_back() {
        let kinds = [
            CustomKind::ShiftScale {
                shift: [1.0, 2.0, 0.0],
                scale: [0.5, 0.25, 1.0],
            },
            CustomKind::ShiftScale {
                shift: [1.0, 2.0, 3.0],
                scale: [0.5, 0.25, 2.0],
            },
            CustomKind::Sexagesimal { factor: 100.0 },
        ];

        for kind in kinds {
            assert_eq!(CustomKind::parse(&kind.to_string()), Some(kind));
        }
    }

    #[test]
    fn directive_of_chain() {
        let chain = CustomTransformation::sexagesimal(100_000.0)
            .with_innermost(CustomTransformation::degrees_to_radians());
        let mut text = format!("+proj=longlat {}", chain.to_directive());

        assert_eq!(text, "+proj=longlat +custom=dms:100000");
        let parsed = CustomTransformation::parse(&mut text, CUSTOM_KEYWORD, true).expect("directive");
        assert_eq!(parsed, CustomTransformation::sexagesimal(100_000.0));
    }

    #[test]
    fn chain_order() {
        // forward: (x + 10) * 2, then * 3
        let chain = CustomTransformation::shift_scale(10.0, 10.0, 2.0, 2.0)
            .with_innermost(CustomTransformation::shift_scale(0.0, 0.0, 3.0, 3.0));
        assert_eq!(chain.len(), 2);

        let (x, y, z) = chain.forward(1.0, 2.0, None);
        assert_eq!((x, y, z), (66.0, 72.0, None));

        let (x, y, z) = chain.inverse(x, y, z);
        assert_abs_diff_eq!(x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 2.0, epsilon = 1e-12);
        assert_eq!(z, None);
    }

    #[test]
    fn z_is_scaled_only_when_present() {
        let chain = CustomTransformation::new(CustomKind::ShiftScale {
            shift: [0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 10.0],
        });

        assert_eq!(chain.forward(1.0, 1.0, Some(2.0)), (1.0, 1.0, Some(30.0)));
        assert_eq!(chain.forward(1.0, 1.0, None), (1.0, 1.0, None));
    }

    #[test]
    fn degrees_to_radians() {
        let chain = CustomTransformation::degrees_to_radians();
        let (x, y, _) = chain.forward(180.0, -90.0, None);
        assert_abs_diff_eq!(x, PI, epsilon = 1e-15);
        assert_abs_diff_eq!(y, -PI / 2.0, epsilon = 1e-15);
    }

    #[test]
    fn sexagesimal_values() {
        let chain = CustomTransformation::sexagesimal(100_000.0);

        // 8°24'13.32" east, 49°00'24.84" north
        let (lon, lat, _) = chain.forward(824_133.2, 4_900_248.4, None);
        assert_abs_diff_eq!(lon, 8.4037, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, 49.0069, epsilon = 1e-9);

        let (x, y, _) = chain.inverse(lon, lat, None);
        assert_abs_diff_eq!(x, 824_133.2, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 4_900_248.4, epsilon = 1e-6);
    }

    #[test]
    fn sexagesimal_carries_rounded_seconds() {
        // 59.99999" rounds up to the next minute
        let packed = decimal_to_sexagesimal(-(10.0 + 59.0 / 60.0 + 59.999_999 / 3600.0));
        assert_abs_diff_eq!(packed, -11.0, epsilon = 1e-12);
    }

    #[test]
    fn slices_match_points() {
        let chain = CustomTransformation::sexagesimal(100.0)
            .with_innermost(CustomTransformation::degrees_to_radians());

        let mut x = vec![1230.0, -4512.3, 0.0];
        let mut y = vec![5959.0, 3000.0, -100.0];
        let mut z = vec![1.0, 2.0, 3.0];
        let expected: Vec<_> = (0..3).map(|i| chain.forward(x[i], y[i], Some(z[i]))).collect();

        chain.forward_slices(&mut x, &mut y, Some(&mut z));
        for i in 0..3 {
            assert_eq!((x[i], y[i], Some(z[i])), expected[i]);
        }

        chain.inverse_slices(&mut x, &mut y, None);
        assert_abs_diff_eq!(x[1], -4512.3, epsilon = 1e-6);
        assert_abs_diff_eq!(y[0], 5959.0, epsilon = 1e-6);
    }
}
