//! JSON export of the analytics bundle

use crate::analytics::AnalyticsBundle;
use crate::error::Result;

/// Serialize the bundle as pretty-printed JSON
///
/// Direct structural serialization; parsing the output back reconstructs a
/// structurally identical bundle.
pub fn to_json(bundle: &AnalyticsBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

/// Parse a bundle back from exported JSON
pub fn from_json(json: &str) -> Result<AnalyticsBundle> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bundle_round_trip() {
        let bundle = AnalyticsBundle {
            kpis: Default::default(),
            treemap: Default::default(),
            roll_rate: Default::default(),
            growth_projection: Vec::new(),
        };
        let json = to_json(&bundle).unwrap();
        let parsed = from_json(&json).unwrap();
        assert_eq!(bundle, parsed);
    }
}
