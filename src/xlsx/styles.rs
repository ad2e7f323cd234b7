//! XLSX styles parsing for number formats.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// How a numeric cell should be interpreted, derived from its number format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Plain number
    Number,
    /// Date or date with time
    DateTime,
    /// Time of day or elapsed time
    Time,
}

/// Styles information parsed from xl/styles.xml.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats: numFmtId -> formatCode
    num_fmts: HashMap<u32, String>,
    /// Cell style formats: style index -> numFmtId
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse styles from xl/styles.xml content.
    ///
    /// Styles only refine how numbers are typed, so a malformed stylesheet
    /// degrades to whatever was read before the error.
    pub fn parse(xml: &str) -> Self {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id_attr(e)),
                    b"numFmt" if in_num_fmts => styles.push_num_fmt(e),
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"numFmt" if in_num_fmts => styles.push_num_fmt(e),
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id_attr(e)),
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stopped reading styles.xml early");
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        styles
    }

    fn push_num_fmt(&mut self, e: &quick_xml::events::BytesStart<'_>) {
        let mut num_fmt_id: Option<u32> = None;
        let mut format_code = String::new();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"numFmtId" => {
                    num_fmt_id = String::from_utf8_lossy(&attr.value).parse().ok();
                }
                b"formatCode" => {
                    format_code = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                }
                _ => {}
            }
        }
        if let Some(id) = num_fmt_id {
            self.num_fmts.insert(id, format_code);
        }
    }

    /// Get the numFmtId for a cell style index.
    pub fn get_num_fmt_id(&self, style_index: usize) -> Option<u32> {
        self.cell_xfs.get(style_index).copied()
    }

    /// Classify the number format applied by a cell style index.
    pub fn number_kind(&self, style_index: usize) -> NumberKind {
        match self.get_num_fmt_id(style_index) {
            Some(id) => self.format_kind(id),
            None => NumberKind::Number,
        }
    }

    /// Classify a numFmtId, built-in or custom.
    pub fn format_kind(&self, num_fmt_id: u32) -> NumberKind {
        // Custom formats may redefine ids in the built-in range
        if let Some(format_code) = self.num_fmts.get(&num_fmt_id) {
            return Self::format_code_kind(format_code);
        }

        match num_fmt_id {
            // 14-17, 22: dates; 27-31, 36, 50-58: East Asian dates
            14..=17 | 22 | 27..=31 | 36 | 50..=58 => NumberKind::DateTime,
            // 18-21, 45-47: times; 32-35: East Asian times
            18..=21 | 32..=35 | 45..=47 => NumberKind::Time,
            _ => NumberKind::Number,
        }
    }

    /// Classify a format code string such as `yyyy-mm-dd` or `h:mm`.
    ///
    /// Date and time tokens only count outside quoted text, escapes and
    /// bracketed sections; bracketed elapsed-time tokens (`[h]`, `[mm]`,
    /// `[ss]`) count as time.
    pub fn format_code_kind(format_code: &str) -> NumberKind {
        // Only the first section applies to positive numbers
        let section = first_section(format_code);

        let mut has_date = false;
        let mut has_time = false;
        let mut has_month_or_minute = false;

        let mut chars = section.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    for q in chars.by_ref() {
                        if q == '"' {
                            break;
                        }
                    }
                }
                '\\' | '_' | '*' => {
                    chars.next();
                }
                '[' => {
                    let mut inner = String::new();
                    for b in chars.by_ref() {
                        if b == ']' {
                            break;
                        }
                        inner.push(b);
                    }
                    let inner = inner.to_ascii_lowercase();
                    if !inner.is_empty() && inner.chars().all(|b| matches!(b, 'h' | 'm' | 's')) {
                        has_time = true;
                    }
                }
                _ => match c.to_ascii_lowercase() {
                    'd' | 'y' => has_date = true,
                    'h' | 's' => has_time = true,
                    'm' => has_month_or_minute = true,
                    _ => {}
                },
            }
        }

        if has_date {
            NumberKind::DateTime
        } else if has_time {
            NumberKind::Time
        } else if has_month_or_minute {
            // A lone "mmm" is a month name
            NumberKind::DateTime
        } else {
            NumberKind::Number
        }
    }

    /// Convert an Excel serial number to a datetime.
    ///
    /// In the 1900 system Excel counts a nonexistent 1900-02-29 (serial 60);
    /// serials before it are shifted by one day so that serial 1 is
    /// 1900-01-01. The 1904 system counts from 1904-01-01 as serial 0.
    /// The fractional part is the time of day, rounded to milliseconds.
    pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }

        let epoch = if date1904 {
            NaiveDate::from_ymd_opt(1904, 1, 1)?
        } else if serial < 60.0 {
            NaiveDate::from_ymd_opt(1899, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(1899, 12, 30)?
        };

        let days = serial.floor();
        let millis = ((serial - days) * MILLIS_PER_DAY).round() as i64;

        epoch
            .and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::try_days(days as i64)?)?
            .checked_add_signed(Duration::try_milliseconds(millis)?)
    }

    /// Convert the fractional part of a serial number to a time of day.
    pub fn serial_to_time(serial: f64) -> Option<NaiveTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let millis = ((serial.fract() * MILLIS_PER_DAY).round() as i64).rem_euclid(86_400_000);
        let secs = (millis / 1000) as u32;
        let nanos = ((millis % 1000) * 1_000_000) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    }
}

fn num_fmt_id_attr(e: &quick_xml::events::BytesStart<'_>) -> u32 {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"numFmtId")
        .and_then(|attr| String::from_utf8_lossy(&attr.value).parse().ok())
        .unwrap_or(0)
}

/// The format code up to the first unquoted, unescaped `;`.
fn first_section(format_code: &str) -> &str {
    let mut in_quote = false;
    let mut escaped = false;
    for (idx, c) in format_code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quote = !in_quote,
            ';' if !in_quote => return &format_code[..idx],
            _ => {}
        }
    }
    format_code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_builtin_date_formats() {
        let styles = Styles::default();

        assert_eq!(styles.format_kind(14), NumberKind::DateTime); // m/d/yyyy
        assert_eq!(styles.format_kind(15), NumberKind::DateTime); // d-mmm-yy
        assert_eq!(styles.format_kind(22), NumberKind::DateTime); // m/d/yy h:mm
        assert_eq!(styles.format_kind(57), NumberKind::DateTime); // yyyy"年"m"月"
        assert_eq!(styles.format_kind(20), NumberKind::Time); // h:mm
        assert_eq!(styles.format_kind(46), NumberKind::Time); // [h]:mm:ss

        assert_eq!(styles.format_kind(0), NumberKind::Number); // General
        assert_eq!(styles.format_kind(2), NumberKind::Number); // 0.00
        assert_eq!(styles.format_kind(10), NumberKind::Number); // 0.00%
    }

    #[test]
    fn test_custom_format_detection() {
        use NumberKind::*;

        assert_eq!(Styles::format_code_kind("mmmm\\ d\\,\\ yyyy"), DateTime);
        assert_eq!(Styles::format_code_kind("yyyy-mm-dd"), DateTime);
        assert_eq!(Styles::format_code_kind("yyyy\"年\"m\"月\"d\"日\""), DateTime);
        assert_eq!(Styles::format_code_kind("[$-409]mmmm\\ d\\,\\ yyyy;@"), DateTime);
        assert_eq!(Styles::format_code_kind("mmm"), DateTime);
        assert_eq!(Styles::format_code_kind("hh:mm:ss"), Time);
        assert_eq!(Styles::format_code_kind("[h]:mm"), Time);
        assert_eq!(Styles::format_code_kind("[mm]"), Time);

        assert_eq!(Styles::format_code_kind("General"), Number);
        assert_eq!(Styles::format_code_kind("0.00"), Number);
        assert_eq!(Styles::format_code_kind("#,##0"), Number);
        assert_eq!(Styles::format_code_kind("\"$\"#,##0.00"), Number);
        assert_eq!(Styles::format_code_kind("[Red]0.00;[Blue]-0.00"), Number);
        assert_eq!(Styles::format_code_kind("0\" days\""), Number);
        assert_eq!(Styles::format_code_kind("0.00_);\\(0.00\\)"), Number);
    }

    #[test]
    fn test_custom_format_overrides_builtin() {
        let xml = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy/mm/dd"/></numFmts>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0"/>
    <xf numFmtId="164" fontId="0" applyNumberFormat="1"/>
    <xf numFmtId="21" fontId="0"><alignment horizontal="left"/></xf>
  </cellXfs>
</styleSheet>"#;

        let styles = Styles::parse(xml);
        assert_eq!(styles.get_num_fmt_id(1), Some(164));
        assert_eq!(styles.number_kind(0), NumberKind::Number);
        assert_eq!(styles.number_kind(1), NumberKind::DateTime);
        assert_eq!(styles.number_kind(2), NumberKind::Time);
        assert_eq!(styles.number_kind(99), NumberKind::Number);
    }

    #[test]
    fn test_serial_to_datetime() {
        let dt = |s| Styles::serial_to_datetime(s, false).unwrap();

        assert_eq!(dt(1.0), ymd_hms(1900, 1, 1, 0, 0, 0));
        assert_eq!(dt(59.0), ymd_hms(1900, 2, 28, 0, 0, 0));
        assert_eq!(dt(61.0), ymd_hms(1900, 3, 1, 0, 0, 0));
        assert_eq!(dt(44197.0), ymd_hms(2021, 1, 1, 0, 0, 0));
        assert_eq!(dt(45658.0), ymd_hms(2025, 1, 1, 0, 0, 0));
        assert_eq!(dt(44197.5), ymd_hms(2021, 1, 1, 12, 0, 0));

        assert_eq!(Styles::serial_to_datetime(-1.0, false), None);
        assert_eq!(Styles::serial_to_datetime(f64::NAN, false), None);
    }

    #[test]
    fn test_serial_to_datetime_1904() {
        let dt = Styles::serial_to_datetime(0.0, true).unwrap();
        assert_eq!(dt, ymd_hms(1904, 1, 1, 0, 0, 0));

        // 2021-01-01 is 1462 days earlier in the 1904 system
        let dt = Styles::serial_to_datetime(44197.0 - 1462.0, true).unwrap();
        assert_eq!(dt, ymd_hms(2021, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_serial_to_time() {
        assert_eq!(
            Styles::serial_to_time(0.5),
            NaiveTime::from_hms_opt(12, 0, 0)
        );
        assert_eq!(
            Styles::serial_to_time(0.75),
            NaiveTime::from_hms_opt(18, 0, 0)
        );
        // Rounds to the nearest millisecond
        assert_eq!(
            Styles::serial_to_time(0.999_999_999_9),
            NaiveTime::from_hms_opt(0, 0, 0)
        );
    }
}
