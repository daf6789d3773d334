use crate::error::ParseError;

// mm to inches
pub const DEFAULT_DISTANCE_MULTIPLIER: f64 = 0.03937;
pub const DEFAULT_NO_OBJECT_THRESHOLD: f64 = 800.0;

const UNICODE_MINUS: char = '\u{2212}';

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl PoseSample {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn label(&self) -> String {
        format!("({:.1}, {:.1}) θ={:.1}°", self.x, self.y, self.theta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistanceReading {
    pub right: Option<f64>,
    pub left: Option<f64>,
}

impl DistanceReading {
    pub fn is_empty(&self) -> bool {
        self.right.is_none() && self.left.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConversion {
    pub multiplier: f64,
    pub no_object_threshold: f64,
}

impl Default for SensorConversion {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_DISTANCE_MULTIPLIER,
            no_object_threshold: DEFAULT_NO_OBJECT_THRESHOLD,
        }
    }
}

impl SensorConversion {
    pub fn to_inches(&self, raw: f64) -> Option<f64> {
        let inches = raw * self.multiplier;
        (inches < self.no_object_threshold).then_some(inches)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedLine {
    pub pose: PoseSample,
    pub reading: Option<DistanceReading>,
}

pub fn parse_line(line: &str, conversion: &SensorConversion) -> Result<ParsedLine, ParseError> {
    let line = line.trim().replace(UNICODE_MINUS, "-");
    if line.is_empty() {
        return Err(ParseError::Arity { found: 0 });
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 && fields.len() != 5 {
        return Err(ParseError::Arity {
            found: fields.len(),
        });
    }

    let values = fields
        .iter()
        .enumerate()
        .map(|(index, field)| parse_field(index, field))
        .collect::<Result<Vec<f64>, _>>()?;

    let pose = PoseSample::new(values[0], values[1], values[2]);
    let reading = (values.len() == 5).then(|| DistanceReading {
        right: conversion.to_inches(values[3]),
        left: conversion.to_inches(values[4]),
    });

    Ok(ParsedLine { pose, reading })
}

fn parse_field(index: usize, field: &str) -> Result<f64, ParseError> {
    if field.is_empty() {
        return Err(ParseError::EmptyField { index });
    }
    let value: f64 = field.parse().map_err(|_| ParseError::NotANumber {
        index,
        field: field.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ParseError::NotFinite { index });
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn three_fields() {
        let parsed = parse_line("1.00, 2.00, 3.00", &SensorConversion::default()).unwrap();
        assert_eq!(parsed.pose, PoseSample::new(1.0, 2.0, 3.0));
        assert!(parsed.reading.is_none());
    }

    #[test]
    fn wrong_arity() {
        let conv = SensorConversion::default();
        assert_eq!(
            parse_line("1,2", &conv),
            Err(ParseError::Arity { found: 2 })
        );
        assert_eq!(
            parse_line("1,2,3,4", &conv),
            Err(ParseError::Arity { found: 4 })
        );
        assert_eq!(parse_line("   ", &conv), Err(ParseError::Arity { found: 0 }));
    }

    #[test]
    fn unicode_minus() {
        let parsed = parse_line("\u{2212}45.00, 0.00, 0.00", &SensorConversion::default()).unwrap();
        assert_eq!(parsed.pose.x, -45.0);
    }

    #[test]
    fn bad_fields() {
        let conv = SensorConversion::default();
        assert_eq!(
            parse_line("1.00, , 3.00", &conv),
            Err(ParseError::EmptyField { index: 1 })
        );
        assert!(matches!(
            parse_line("1.00, 2.0x, 3.00", &conv),
            Err(ParseError::NotANumber { index: 1, .. })
        ));
        assert_eq!(
            parse_line("1.00, 2.00, NaN", &conv),
            Err(ParseError::NotFinite { index: 2 })
        );
        assert_eq!(
            parse_line("1.00, 2.00, inf", &conv),
            Err(ParseError::NotFinite { index: 2 })
        );
    }

    #[test]
    fn five_fields_converted() {
        let conv = SensorConversion::default();
        let parsed = parse_line("10.00, 20.00, 90.00, 254.00, 508.00", &conv).unwrap();
        let reading = parsed.reading.unwrap();
        assert_relative_eq!(reading.right.unwrap(), 254.0 * 0.03937);
        assert_relative_eq!(reading.left.unwrap(), 508.0 * 0.03937);
    }

    #[test]
    fn no_object_sentinel() {
        let conv = SensorConversion {
            multiplier: 1.0,
            no_object_threshold: 800.0,
        };
        let parsed = parse_line("0, 0, 0, 800.00, 799.99", &conv).unwrap();
        let reading = parsed.reading.unwrap();
        assert_eq!(reading.right, None);
        assert_eq!(reading.left, Some(799.99));

        let parsed = parse_line("0, 0, 0, 9999, 9999", &conv).unwrap();
        assert!(parsed.reading.unwrap().is_empty());
    }

    #[test]
    fn label_format() {
        assert_eq!(
            PoseSample::new(1.26, -3.0, 45.04).label(),
            "(1.3, -3.0) θ=45.0°"
        );
    }
}
