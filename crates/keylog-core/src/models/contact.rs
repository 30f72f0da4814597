use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Band
// ============================================================================

/// Operating band. Declaration order is low frequency to high frequency,
/// which is also the sort order used in every per-band breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Band {
    #[serde(rename = "160M")]
    M160,
    #[serde(rename = "80M")]
    M80,
    #[serde(rename = "60M")]
    M60,
    #[serde(rename = "40M")]
    M40,
    #[serde(rename = "30M")]
    M30,
    #[serde(rename = "20M")]
    M20,
    #[serde(rename = "17M")]
    M17,
    #[serde(rename = "15M")]
    M15,
    #[serde(rename = "12M")]
    M12,
    #[serde(rename = "10M")]
    M10,
    #[serde(rename = "6M")]
    M6,
    #[serde(rename = "2M")]
    M2,
}

impl Band {
    pub const ALL: [Band; 12] = [
        Band::M160,
        Band::M80,
        Band::M60,
        Band::M40,
        Band::M30,
        Band::M20,
        Band::M17,
        Band::M15,
        Band::M12,
        Band::M10,
        Band::M6,
        Band::M2,
    ];

    /// All HF amateur bands, 160M through 10M.
    pub const HF: [Band; 10] = [
        Band::M160,
        Band::M80,
        Band::M60,
        Band::M40,
        Band::M30,
        Band::M20,
        Band::M17,
        Band::M15,
        Band::M12,
        Band::M10,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::M160 => "160M",
            Band::M80 => "80M",
            Band::M60 => "60M",
            Band::M40 => "40M",
            Band::M30 => "30M",
            Band::M20 => "20M",
            Band::M17 => "17M",
            Band::M15 => "15M",
            Band::M12 => "12M",
            Band::M10 => "10M",
            Band::M6 => "6M",
            Band::M2 => "2M",
        }
    }

    /// Parse a band code such as `"40m"` or `"40M"`. Unknown codes yield `None`.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|band| band.as_str().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Mode {
    Cw,
    Ssb,
    Am,
    Fm,
    Rtty,
    Psk,
    Ft8,
    Ft4,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Cw,
        Mode::Ssb,
        Mode::Am,
        Mode::Fm,
        Mode::Rtty,
        Mode::Psk,
        Mode::Ft8,
        Mode::Ft4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Cw => "CW",
            Mode::Ssb => "SSB",
            Mode::Am => "AM",
            Mode::Fm => "FM",
            Mode::Rtty => "RTTY",
            Mode::Psk => "PSK",
            Mode::Ft8 => "FT8",
            Mode::Ft4 => "FT4",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Equipment Class
// ============================================================================

/// Keying device used by the operator for a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum EquipmentClass {
    Straight,
    Bug,
    Sideswiper,
    Keyer,
}

impl EquipmentClass {
    pub const MECHANICAL: [EquipmentClass; 3] = [
        EquipmentClass::Straight,
        EquipmentClass::Bug,
        EquipmentClass::Sideswiper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentClass::Straight => "STRAIGHT",
            EquipmentClass::Bug => "BUG",
            EquipmentClass::Sideswiper => "SIDESWIPER",
            EquipmentClass::Keyer => "KEYER",
        }
    }

    /// Parse a key type, accepting the usual exchange abbreviations
    /// (`SK`, `SS`, `PADDLE`).
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "STRAIGHT" | "SK" | "STRAIGHT KEY" => Some(EquipmentClass::Straight),
            "BUG" | "SEMI-AUTOMATIC" => Some(EquipmentClass::Bug),
            "SIDESWIPER" | "SS" | "COOTIE" => Some(EquipmentClass::Sideswiper),
            "KEYER" | "PADDLE" | "ELECTRONIC" => Some(EquipmentClass::Keyer),
            _ => None,
        }
    }

    pub fn is_mechanical(&self) -> bool {
        Self::MECHANICAL.contains(self)
    }
}

impl std::fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Contact Record
// ============================================================================

/// A logged contact as supplied by the contact store.
///
/// Coded fields (band, mode, key type) and the date are deserialized
/// leniently: a value the engine does not recognize becomes `None`, so one
/// bad row never rejects a whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub callsign: String,
    #[serde(default, alias = "qso_date", deserialize_with = "deserialize_date")]
    pub date: Option<NaiveDate>,
    /// UTC time the contact started.
    #[serde(default, alias = "qso_time", alias = "time_on", deserialize_with = "deserialize_time")]
    pub time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_band")]
    pub band: Option<Band>,
    #[serde(default, deserialize_with = "deserialize_mode")]
    pub mode: Option<Mode>,
    /// Raw membership identifier as exchanged, e.g. `"12345Tx2"`.
    #[serde(default, alias = "skcc_number")]
    pub remote_membership: Option<String>,
    #[serde(default, alias = "key_type", deserialize_with = "deserialize_equipment")]
    pub equipment_class: Option<EquipmentClass>,
    #[serde(default)]
    pub tx_power: Option<f64>,
    #[serde(default)]
    pub rx_power: Option<f64>,
    /// Distance to the remote station in miles.
    #[serde(default)]
    pub distance: Option<f64>,
    /// State or province code.
    #[serde(default, alias = "state")]
    pub region: Option<String>,
    /// Two-letter continent code.
    #[serde(default)]
    pub continent: Option<String>,
    /// Length of the contact in minutes.
    #[serde(default, alias = "duration_minutes")]
    pub duration: Option<f64>,
    /// DXCC entity number of the remote station.
    #[serde(default, alias = "dxcc", deserialize_with = "deserialize_entity")]
    pub entity: Option<u32>,
}

impl ContactRecord {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            date: None,
            time: None,
            band: None,
            mode: None,
            remote_membership: None,
            equipment_class: None,
            tx_power: None,
            rx_power: None,
            distance: None,
            region: None,
            continent: None,
            duration: None,
            entity: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_membership(mut self, raw: impl Into<String>) -> Self {
        self.remote_membership = Some(raw.into());
        self
    }

    pub fn with_equipment(mut self, class: EquipmentClass) -> Self {
        self.equipment_class = Some(class);
        self
    }

    pub fn with_tx_power(mut self, watts: f64) -> Self {
        self.tx_power = Some(watts);
        self
    }

    pub fn with_rx_power(mut self, watts: f64) -> Self {
        self.rx_power = Some(watts);
        self
    }

    pub fn with_distance(mut self, miles: f64) -> Self {
        self.distance = Some(miles);
        self
    }

    pub fn with_region(mut self, code: impl Into<String>) -> Self {
        self.region = Some(code.into());
        self
    }

    pub fn with_continent(mut self, code: impl Into<String>) -> Self {
        self.continent = Some(code.into());
        self
    }

    pub fn with_duration(mut self, minutes: f64) -> Self {
        self.duration = Some(minutes);
        self
    }

    pub fn with_entity(mut self, entity: u32) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Transmit power, or `None` when unrecorded, non-positive or not finite.
    /// Anything returned here is safe to divide by.
    pub fn effective_tx_power(&self) -> Option<f64> {
        positive(self.tx_power)
    }

    pub fn effective_rx_power(&self) -> Option<f64> {
        positive(self.rx_power)
    }

    pub fn effective_distance(&self) -> Option<f64> {
        positive(self.distance)
    }

    pub fn effective_duration(&self) -> Option<f64> {
        positive(self.duration)
    }

    /// Operating from a vessel (`/MM` suffix).
    pub fn is_maritime_mobile(&self) -> bool {
        self.callsign
            .trim()
            .split('/')
            .skip(1)
            .any(|part| part.eq_ignore_ascii_case("MM"))
    }

    /// Membership string with surrounding whitespace removed; blank counts as absent.
    pub fn membership(&self) -> Option<&str> {
        self.remote_membership
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Callsign with any portable/operating suffix or prefix removed
    /// (`K9SKC/4` becomes `K9SKC`).
    pub fn base_callsign(&self) -> String {
        self.callsign
            .trim()
            .split('/')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase()
    }

    pub fn normalized_region(&self) -> Option<String> {
        normalize_code(self.region.as_deref())
    }

    pub fn normalized_continent(&self) -> Option<String> {
        normalize_code(self.continent.as_deref())
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn normalize_code(code: Option<&str>) -> Option<String> {
    code.map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
}

// ============================================================================
// Lenient deserializers
// ============================================================================

fn deserialize_band<'de, D>(deserializer: D) -> Result<Option<Band>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Band::parse))
}

fn deserialize_mode<'de, D>(deserializer: D) -> Result<Option<Mode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Mode::parse))
}

fn deserialize_equipment<'de, D>(deserializer: D) -> Result<Option<EquipmentClass>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(EquipmentClass::parse))
}

/// Parse `YYYY-MM-DD` or the interchange-file form `YYYYMMDD`.
pub fn parse_contact_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}

/// Parse `HH:MM[:SS]` or the interchange-file forms `HHMM` and `HHMMSS`.
pub fn parse_contact_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    ["%H:%M:%S", "%H:%M", "%H%M%S", "%H%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct TimeVisitor;

    impl<'de> de::Visitor<'de> for TimeVisitor {
        type Value = Option<NaiveTime>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a time string or HHMM number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(parse_contact_time(v))
        }

        // 930 means 09:30
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            let padded = if v < 10_000 {
                format!("{:04}", v)
            } else {
                format!("{:06}", v)
            };
            Ok(parse_contact_time(&padded))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            match u64::try_from(v) {
                Ok(v) => self.visit_u64(v),
                Err(_) => Ok(None),
            }
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(TimeVisitor)
}

// Entity numbers arrive as 291 or "291"; anything else is absent
fn deserialize_entity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct EntityVisitor;

    impl<'de> de::Visitor<'de> for EntityVisitor {
        type Value = Option<u32>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an entity number or numeric string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse::<u32>().ok().filter(|n| *n > 0))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok().filter(|n| *n > 0))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok().filter(|n| *n > 0))
        }

        fn visit_f64<E>(self, _v: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(EntityVisitor)
}

// Helper to deserialize a date given as "2024-01-15", "20240115" or 20240115
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct DateVisitor;

    impl<'de> de::Visitor<'de> for DateVisitor {
        type Value = Option<NaiveDate>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a date string or YYYYMMDD number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(parse_contact_date(v))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(parse_contact_date(&v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(parse_contact_date(&v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(DateVisitor)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_parse_case_insensitive() {
        assert_eq!(Band::parse("40m"), Some(Band::M40));
        assert_eq!(Band::parse(" 160M "), Some(Band::M160));
        assert_eq!(Band::parse("70CM"), None);
    }

    #[test]
    fn test_band_ordering_low_to_high() {
        assert!(Band::M160 < Band::M80);
        assert!(Band::M10 < Band::M6);
    }

    #[test]
    fn test_equipment_abbreviations() {
        assert_eq!(EquipmentClass::parse("sk"), Some(EquipmentClass::Straight));
        assert_eq!(EquipmentClass::parse("SS"), Some(EquipmentClass::Sideswiper));
        assert_eq!(EquipmentClass::parse("paddle"), Some(EquipmentClass::Keyer));
        assert_eq!(EquipmentClass::parse("iambic"), None);
        assert!(!EquipmentClass::Keyer.is_mechanical());
        assert!(EquipmentClass::Bug.is_mechanical());
    }

    #[test]
    fn test_non_positive_power_is_absent() {
        let contact = ContactRecord::new("K1ABC").with_tx_power(0.0);
        assert_eq!(contact.effective_tx_power(), None);

        let contact = ContactRecord::new("K1ABC").with_tx_power(-3.0);
        assert_eq!(contact.effective_tx_power(), None);

        let contact = ContactRecord::new("K1ABC").with_tx_power(f64::NAN);
        assert_eq!(contact.effective_tx_power(), None);

        let contact = ContactRecord::new("K1ABC").with_tx_power(0.5);
        assert_eq!(contact.effective_tx_power(), Some(0.5));
    }

    #[test]
    fn test_base_callsign_strips_portable() {
        assert_eq!(ContactRecord::new("k9skc/4").base_callsign(), "K9SKC");
        assert_eq!(ContactRecord::new("W1AW").base_callsign(), "W1AW");
    }

    #[test]
    fn test_deserialize_lenient_fields() {
        let json = r#"{
            "callsign": "VE3XYZ",
            "qso_date": "20150704",
            "band": "40m",
            "mode": "cw",
            "skcc_number": "1234T",
            "key_type": "WOBBLE",
            "state": "on"
        }"#;
        let contact: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(contact.date, NaiveDate::from_ymd_opt(2015, 7, 4));
        assert_eq!(contact.band, Some(Band::M40));
        assert_eq!(contact.mode, Some(Mode::Cw));
        assert_eq!(contact.membership(), Some("1234T"));
        assert_eq!(contact.equipment_class, None);
        assert_eq!(contact.normalized_region().as_deref(), Some("ON"));
    }

    #[test]
    fn test_deserialize_unknown_band_and_bad_date() {
        let json = r#"{"callsign": "K1ABC", "date": "not a date", "band": "11M", "mode": "OLIVIA"}"#;
        let contact: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(contact.date, None);
        assert_eq!(contact.band, None);
        assert_eq!(contact.mode, None);
    }

    #[test]
    fn test_deserialize_numeric_date() {
        let json = r#"{"callsign": "K1ABC", "date": 20190102}"#;
        let contact: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(contact.date, NaiveDate::from_ymd_opt(2019, 1, 2));
    }

    #[test]
    fn test_deserialize_time_and_entity() {
        let json = r#"{"callsign": "DL1AA", "qso_time": "1430", "dxcc": "230", "duration": 45}"#;
        let contact: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(contact.time, NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(contact.entity, Some(230));
        assert_eq!(contact.effective_duration(), Some(45.0));

        let json = r#"{"callsign": "DL1AA", "time_on": 930, "dxcc": "none"}"#;
        let contact: ContactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(contact.time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(contact.entity, None);
    }

    #[test]
    fn test_parse_contact_time_forms() {
        assert_eq!(parse_contact_time("14:30:15"), NaiveTime::from_hms_opt(14, 30, 15));
        assert_eq!(parse_contact_time("143015"), NaiveTime::from_hms_opt(14, 30, 15));
        assert_eq!(parse_contact_time("2561"), None);
    }

    #[test]
    fn test_maritime_mobile_suffix() {
        assert!(ContactRecord::new("W1AW/MM").is_maritime_mobile());
        assert!(ContactRecord::new("w1aw/mm").is_maritime_mobile());
        assert!(!ContactRecord::new("W1AW/M").is_maritime_mobile());
        assert!(!ContactRecord::new("MM0ABC").is_maritime_mobile());
    }

    #[test]
    fn test_blank_membership_is_absent() {
        let contact = ContactRecord::new("K1ABC").with_membership("   ");
        assert_eq!(contact.membership(), None);
    }
}
