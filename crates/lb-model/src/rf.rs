//! RF station command policy.
//!
//! On copper-linac beam paths the in-use state of a station can be driven
//! by its beam-code status flag instead of the computed accelerate value.
//! This is an opt-in facility policy configured per model; stations listed
//! in `always_enabled` keep their computed command.

use crate::error::{ModelError, ModelResult};
use crate::transformer::StationStatus;
use lb_catalog::controls::RF_IN_USE_ATTRIBUTE;
use lb_engine::SetElement;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sector and station of an RF element named `K<sector>_<station>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationId {
    pub sector: String,
    pub station: String,
}

impl StationId {
    pub fn parse(element: &str) -> Option<Self> {
        let (sector, station) = element.strip_prefix('K')?.split_once('_')?;
        if sector.is_empty() || station.is_empty() {
            return None;
        }
        Some(Self {
            sector: sector.to_string(),
            station: station.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusOverride {
    #[serde(default = "default_beam_path_prefix")]
    pub beam_path_prefix: String,
    #[serde(default = "default_beam_code")]
    pub beam_code: u32,
    #[serde(default = "default_always_enabled")]
    pub always_enabled: Vec<String>,
}

fn default_beam_path_prefix() -> String {
    "cu".to_string()
}

fn default_beam_code() -> u32 {
    1
}

fn default_always_enabled() -> Vec<String> {
    vec!["K21_1".to_string(), "K21_2".to_string()]
}

impl Default for StatusOverride {
    fn default() -> Self {
        Self {
            beam_path_prefix: default_beam_path_prefix(),
            beam_code: default_beam_code(),
            always_enabled: default_always_enabled(),
        }
    }
}

impl StatusOverride {
    pub fn applies(&self, beam_path: &str) -> bool {
        beam_path.starts_with(&self.beam_path_prefix)
    }

    /// `KLYS:LI<sector>:<station>1:BEAMCODE<code>_STAT`
    pub fn status_pv(&self, station: &StationId) -> String {
        format!(
            "KLYS:LI{}:{}1:BEAMCODE{}_STAT",
            station.sector, station.station, self.beam_code
        )
    }

    /// Replace the value of non-exempt `in_use` commands with the station's
    /// status flag. Other commands pass through unchanged.
    pub fn rewrite(
        &self,
        commands: Vec<String>,
        status: &StationStatus,
    ) -> ModelResult<Vec<String>> {
        commands
            .into_iter()
            .map(|cmd| self.rewrite_one(cmd, status))
            .collect()
    }

    fn rewrite_one(&self, cmd: String, status: &StationStatus) -> ModelResult<String> {
        let Some(set) = SetElement::parse(&cmd) else {
            return Ok(cmd);
        };
        if !set.attribute.eq_ignore_ascii_case(RF_IN_USE_ATTRIBUTE)
            || self.always_enabled.iter().any(|e| e == set.element)
        {
            return Ok(cmd);
        }
        let station = StationId::parse(set.element).ok_or_else(|| ModelError::Conversion {
            name: set.element.to_string(),
            reason: "RF element name is not of the form K<sector>_<station>".to_string(),
        })?;
        let pv = self.status_pv(&station);
        let flag = status
            .get(&pv)
            .copied()
            .ok_or(ModelError::StatusFlagMissing { pv: pv.clone() })?;
        debug!(element = set.element, %pv, flag, "in_use taken from station status");
        Ok(set.with_value(flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_ids() {
        assert_eq!(
            StationId::parse("K24_6"),
            Some(StationId {
                sector: "24".into(),
                station: "6".into()
            })
        );
        assert_eq!(StationId::parse("Q24_6"), None);
        assert_eq!(StationId::parse("K24"), None);
    }

    #[test]
    fn status_pv_name() {
        let policy = StatusOverride::default();
        let pv = policy.status_pv(&StationId::parse("K24_6").unwrap());
        assert_eq!(pv, "KLYS:LI24:61:BEAMCODE1_STAT");
    }

    #[test]
    fn rewrites_only_non_exempt_in_use() {
        let policy = StatusOverride::default();
        let status = StationStatus::from([("KLYS:LI24:61:BEAMCODE1_STAT".to_string(), 0.0)]);
        let cmds = vec![
            "set ele K24_6 ENLD_MEV = 220".to_string(),
            "set ele K24_6 in_use = 1".to_string(),
            "set ele K21_1 in_use = 1".to_string(),
        ];
        let out = policy.rewrite(cmds, &status).unwrap();
        assert_eq!(
            out,
            [
                "set ele K24_6 ENLD_MEV = 220",
                "set ele K24_6 in_use = 0",
                "set ele K21_1 in_use = 1",
            ]
        );
    }

    #[test]
    fn missing_flag_is_an_error() {
        let policy = StatusOverride::default();
        let err = policy
            .rewrite(vec!["set ele K25_1 in_use = 1".to_string()], &StationStatus::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::StatusFlagMissing { pv } if pv == "KLYS:LI25:11:BEAMCODE1_STAT"
        ));
    }

    #[test]
    fn applies_by_beam_path_prefix() {
        let policy = StatusOverride::default();
        assert!(policy.applies("cu_hxr"));
        assert!(!policy.applies("sc_sxr"));
    }
}
