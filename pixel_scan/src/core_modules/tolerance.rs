// THEORY:
// The tolerance matcher answers one question: "do the pixels around the cursor
// still look like they did?" It is configured with a list of checks, each one an
// offset from the cursor plus a set of (property, tolerance) pairs.
//
// Construction does all the expensive work once:
// 1.  A reference sample is captured at each offset (unless one was supplied).
// 2.  Every property name is parsed into a `SampleProperty`.
// 3.  Every tolerance is turned into an absolute, inclusive `[min, max]` range by
//     adding the reference value, then frozen.
//
// A `check` afterwards only re-samples the offsets and compares numbers. A property
// the fresh sample cannot provide (hue of a gray pixel, an offset that fell outside
// the view) simply fails.

use crate::core_modules::pixel_view::PixelView;
use crate::core_modules::sample::PixelSample;
use crate::error::MatchError;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// A numeric property readable from a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleProperty {
    Red,
    Green,
    Blue,
    Alpha,
    /// The scalar intensity of a gray sample.
    Gray,
    Hue,
    Saturation,
    Value,
    Luminance,
}

impl SampleProperty {
    pub fn name(self) -> &'static str {
        match self {
            SampleProperty::Red => "red",
            SampleProperty::Green => "green",
            SampleProperty::Blue => "blue",
            SampleProperty::Alpha => "alpha",
            SampleProperty::Gray => "gray",
            SampleProperty::Hue => "hue",
            SampleProperty::Saturation => "saturation",
            SampleProperty::Value => "value",
            SampleProperty::Luminance => "luminance",
        }
    }

    /// Reads the property, or `None` if this kind of sample does not have it.
    pub fn read(self, sample: &PixelSample) -> Option<f64> {
        match self {
            SampleProperty::Red => sample.red().map(f64::from),
            SampleProperty::Green => sample.green().map(f64::from),
            SampleProperty::Blue => sample.blue().map(f64::from),
            SampleProperty::Alpha => Some(f64::from(sample.alpha())),
            SampleProperty::Gray => sample.gray_value().map(f64::from),
            SampleProperty::Hue => sample.hue(),
            SampleProperty::Saturation => sample.saturation(),
            SampleProperty::Value => sample.value(),
            SampleProperty::Luminance => Some(f64::from(sample.luminance())),
        }
    }
}

impl fmt::Display for SampleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleProperty {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" | "red" => Ok(SampleProperty::Red),
            "g" | "green" => Ok(SampleProperty::Green),
            "b" | "blue" => Ok(SampleProperty::Blue),
            "a" | "alpha" => Ok(SampleProperty::Alpha),
            "v" | "gray" => Ok(SampleProperty::Gray),
            "hue" => Ok(SampleProperty::Hue),
            "sat" | "saturation" => Ok(SampleProperty::Saturation),
            "val" | "value" => Ok(SampleProperty::Value),
            "lum" | "luminance" => Ok(SampleProperty::Luminance),
            other => Err(MatchError::UnknownProperty(other.to_string())),
        }
    }
}

/// Acceptance window around a reference value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Symmetric: `reference ± delta`.
    Delta(f64),
    /// Asymmetric: `reference + min ..= reference + max`.
    Range { min: f64, max: f64 },
}

impl Tolerance {
    fn relative_bounds(self, property: SampleProperty) -> Result<(f64, f64), MatchError> {
        let (min, max) = match self {
            Tolerance::Delta(delta) => (-delta.abs(), delta.abs()),
            Tolerance::Range { min, max } => (min, max),
        };
        if min.is_nan() || max.is_nan() || min > max {
            return Err(MatchError::InvalidRange {
                property: property.name(),
                min,
                max,
            });
        }
        Ok((min, max))
    }
}

/// One check: an offset from the cursor and the properties to compare there.
#[derive(Debug, Clone, Default)]
pub struct CheckSpec {
    pub offset: (i32, i32),
    /// Compared against instead of the pixel found at construction time.
    pub reference: Option<PixelSample>,
    pub tolerances: Vec<(String, Tolerance)>,
}

impl CheckSpec {
    pub fn at(dx: i32, dy: i32) -> Self {
        Self {
            offset: (dx, dy),
            ..Self::default()
        }
    }

    pub fn reference(mut self, sample: PixelSample) -> Self {
        self.reference = Some(sample);
        self
    }

    pub fn tolerance(mut self, property: impl Into<String>, tolerance: Tolerance) -> Self {
        self.tolerances.push((property.into(), tolerance));
        self
    }

    /// Shorthand for a symmetric tolerance.
    pub fn within(self, property: impl Into<String>, delta: f64) -> Self {
        self.tolerance(property, Tolerance::Delta(delta))
    }
}

/// A frozen, absolute acceptance range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRange {
    pub property: SampleProperty,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
struct ResolvedCheck {
    offset: (i32, i32),
    reference: PixelSample,
    ranges: Vec<PropertyRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyResult {
    pub property: SampleProperty,
    /// What was read; `None` if the sample lacked the property or was missing.
    pub value: Option<f64>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub offset: (i32, i32),
    pub properties: Vec<PropertyResult>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.properties.iter().all(|p| p.passed)
    }
}

/// The result of one `check` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// AND over every property of every check.
    pub passed: bool,
    pub checks: Vec<CheckResult>,
}

/// Inclusive range test.
pub fn in_range(value: f64, min: f64, max: f64) -> bool {
    !(value < min || value > max)
}

/// Compares pixels around a view's cursor against frozen reference ranges.
#[derive(Debug, Clone)]
pub struct ToleranceMatcher {
    checks: Vec<ResolvedCheck>,
    last_samples: Vec<Option<PixelSample>>,
    last_outcome: Option<CheckOutcome>,
}

impl ToleranceMatcher {
    pub fn new(view: &PixelView, specs: Vec<CheckSpec>) -> Result<Self, MatchError> {
        let mut checks = Vec::with_capacity(specs.len());

        for (index, spec) in specs.into_iter().enumerate() {
            let (dx, dy) = spec.offset;
            let reference = match spec.reference {
                Some(sample) => sample,
                None => view
                    .sample(dx, dy)
                    .ok_or(MatchError::ReferenceOutOfView { index, dx, dy })?,
            };

            let mut ranges = Vec::with_capacity(spec.tolerances.len());
            for (name, tolerance) in &spec.tolerances {
                let property: SampleProperty = name.parse()?;
                let base = property.read(&reference).ok_or(MatchError::MissingProperty {
                    index,
                    property: property.name(),
                })?;
                let (min, max) = tolerance.relative_bounds(property)?;
                ranges.push(PropertyRange {
                    property,
                    min: base + min,
                    max: base + max,
                });
            }

            checks.push(ResolvedCheck {
                offset: spec.offset,
                reference,
                ranges,
            });
        }

        debug!(checks = checks.len(), "tolerance matcher ready");
        let count = checks.len();
        Ok(Self {
            checks,
            last_samples: vec![None; count],
            last_outcome: None,
        })
    }

    /// The frozen ranges of the check at `index`.
    pub fn ranges(&self, index: usize) -> Option<&[PropertyRange]> {
        self.checks.get(index).map(|c| c.ranges.as_slice())
    }

    pub fn reference(&self, index: usize) -> Option<&PixelSample> {
        self.checks.get(index).map(|c| &c.reference)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Re-samples every offset around the view's cursor and tests each range.
    pub fn check(&mut self, view: &PixelView) -> CheckOutcome {
        let mut passed = true;
        let mut results = Vec::with_capacity(self.checks.len());

        for (check, slot) in self.checks.iter().zip(self.last_samples.iter_mut()) {
            let (dx, dy) = check.offset;
            *slot = view.sample(dx, dy);

            let properties: Vec<PropertyResult> = check
                .ranges
                .iter()
                .map(|range| {
                    let value = slot.as_ref().and_then(|s| range.property.read(s));
                    let ok = value.is_some_and(|v| in_range(v, range.min, range.max));
                    PropertyResult {
                        property: range.property,
                        value,
                        passed: ok,
                    }
                })
                .collect();

            passed &= properties.iter().all(|p| p.passed);
            results.push(CheckResult {
                offset: check.offset,
                properties,
            });
        }

        trace!(passed, cursor = ?view.cursor(), "tolerance check");
        let outcome = CheckOutcome {
            passed,
            checks: results,
        };
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Samples read by the most recent `check`.
    pub fn last_samples(&self) -> &[Option<PixelSample>] {
        &self.last_samples
    }

    pub fn last_outcome(&self) -> Option<&CheckOutcome> {
        self.last_outcome.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::core_modules::buffer::PixelSource;
    use crate::core_modules::color_math::{Rgb, Rgba};

    fn reds(values: &[u8]) -> PixelView {
        let data = values.iter().flat_map(|&r| [r, 0, 0, 255]).collect();
        PixelView::new(
            PixelSource::Rgba {
                width: values.len() as u32,
                height: 1,
                data,
            },
            ViewConfig::default(),
        )
        .expect("valid source")
    }

    #[test]
    fn symmetric_tolerance_is_inclusive() {
        let mut view = reds(&[128, 137, 138, 139]);
        view.move_to(0, 0);
        let mut matcher =
            ToleranceMatcher::new(&view, vec![CheckSpec::at(0, 0).within("red", 10.0)]).expect("resolvable");
        assert_eq!(
            matcher.ranges(0),
            Some(
                &[PropertyRange {
                    property: SampleProperty::Red,
                    min: 118.0,
                    max: 138.0
                }][..]
            )
        );

        view.move_to(1, 0);
        assert!(matcher.check(&view).passed);
        view.move_to(2, 0);
        assert!(matcher.check(&view).passed);
        view.move_to(3, 0);
        let outcome = matcher.check(&view);
        assert!(!outcome.passed);
        assert_eq!(outcome.checks[0].properties[0].value, Some(139.0));
    }

    #[test]
    fn every_check_must_pass() {
        let mut view = reds(&[10, 20, 30, 200]);
        view.move_to(1, 0);
        let specs = vec![
            CheckSpec::at(-1, 0).within("r", 0.0),
            CheckSpec::at(1, 0).tolerance("r", Tolerance::Range { min: 0.0, max: 5.0 }),
        ];
        let mut matcher = ToleranceMatcher::new(&view, specs).expect("resolvable");
        assert!(matcher.check(&view).passed);

        view.move_to(2, 0);
        let outcome = matcher.check(&view);
        assert!(!outcome.passed);
        assert!(!outcome.checks[0].passed());
        assert!(!outcome.checks[1].passed());
        assert_eq!(matcher.last_samples()[1].as_ref().and_then(PixelSample::red), Some(200));
    }

    #[test]
    fn unknown_property_is_rejected() {
        let mut view = reds(&[1]);
        view.move_to(0, 0);
        let err = ToleranceMatcher::new(&view, vec![CheckSpec::at(0, 0).within("chroma", 1.0)]).unwrap_err();
        assert_eq!(err, MatchError::UnknownProperty("chroma".into()));
    }

    #[test]
    fn reference_must_be_inside_the_view() {
        let mut view = reds(&[1, 2]);
        view.move_to(1, 0);
        let err = ToleranceMatcher::new(&view, vec![CheckSpec::at(1, 0).within("red", 1.0)]).unwrap_err();
        assert_eq!(err, MatchError::ReferenceOutOfView { index: 0, dx: 1, dy: 0 });
    }

    #[test]
    fn gray_reference_has_no_hue() {
        let mut view = PixelView::new(
            PixelSource::Gray {
                width: 1,
                height: 1,
                data: vec![50],
            },
            ViewConfig::default(),
        )
        .expect("valid source");
        view.move_to(0, 0);
        let err = ToleranceMatcher::new(&view, vec![CheckSpec::at(0, 0).within("hue", 5.0)]).unwrap_err();
        assert_eq!(
            err,
            MatchError::MissingProperty {
                index: 0,
                property: "hue"
            }
        );

        let mut matcher =
            ToleranceMatcher::new(&view, vec![CheckSpec::at(0, 0).within("gray", 5.0).within("lum", 0.0)])
                .expect("gray sample has gray and luminance");
        assert!(matcher.check(&view).passed);
    }

    #[test]
    fn explicit_reference_and_missing_offsets() {
        let mut view = reds(&[100, 0]);
        view.move_to(0, 0);
        let reference = PixelSample::color(Rgba::new(90, 0, 0, 255), Rgb::WHITE);
        let mut matcher = ToleranceMatcher::new(
            &view,
            vec![CheckSpec::at(0, 0)
                .reference(reference)
                .tolerance("red", Tolerance::Range { min: 5.0, max: 15.0 })],
        )
        .expect("resolvable");
        assert!(matcher.check(&view).passed);

        let mut neighbour =
            ToleranceMatcher::new(&view, vec![CheckSpec::at(1, 0).within("red", 255.0)]).expect("resolvable");
        view.move_to(1, 0);
        let outcome = neighbour.check(&view);
        assert!(!outcome.passed);
        assert_eq!(outcome.checks[0].properties[0].value, None);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut view = reds(&[1]);
        view.move_to(0, 0);
        let err = ToleranceMatcher::new(
            &view,
            vec![CheckSpec::at(0, 0).tolerance("red", Tolerance::Range { min: 3.0, max: -3.0 })],
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::InvalidRange { property: "red", .. }));
    }

    #[test]
    fn range_helper_is_inclusive() {
        assert!(in_range(5.0, 5.0, 6.0));
        assert!(in_range(6.0, 5.0, 6.0));
        assert!(!in_range(6.01, 5.0, 6.0));
    }

    #[test]
    fn property_aliases() {
        for (alias, property) in [
            ("v", SampleProperty::Gray),
            ("sat", SampleProperty::Saturation),
            ("val", SampleProperty::Value),
            ("a", SampleProperty::Alpha),
        ] {
            assert_eq!(alias.parse::<SampleProperty>(), Ok(property));
        }
    }
}
