use serde::{Deserialize, Serialize};

use crate::{
    error::UpstreamError,
    types::{Celsius, Flag, SeasonMode},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveState {
    pub tempc: Celsius,
    pub tempt: Celsius,
    #[serde(default)]
    pub state1: Flag,
    #[serde(default)]
    pub state2: Flag,
    #[serde(default)]
    pub mode: SeasonMode,
}

impl LiveState {
    pub fn parse(body: &[u8]) -> Result<Self, UpstreamError> {
        serde_json::from_slice(body).map_err(|err| UpstreamError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempt: Option<Celsius>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_control_loop_document() {
        let live = LiveState::parse(
            br#"{"tempc":"21.3","tempt":"22.0","state1":1,"state2":0,"mode":"heating","pressure":"1.2"}"#,
        )
        .unwrap();

        assert_eq!(live.tempc.one_decimal(), "21.3");
        assert_eq!(live.tempt.whole_degrees(), 22);
        assert!(live.state1.is_on());
        assert!(!live.state2.is_on());
        assert_eq!(live.mode, SeasonMode::Heating);
    }

    #[test]
    fn empty_body_is_malformed() {
        assert!(matches!(
            LiveState::parse(b""),
            Err(UpstreamError::Malformed(_))
        ));
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let value = serde_json::to_value(LiveStatePatch::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
