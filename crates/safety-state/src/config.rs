//! Decision engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ConfigError, SafetyState};

/// TTC thresholds (seconds); a TTC below a threshold selects that state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtcThresholds {
    /// Hysteresis bypass, straight to THREAT
    pub threat_s: f64,
    pub critical_s: f64,
    pub care_s: f64,
    pub intent_s: f64,
    pub awareness_s: f64,
}

impl Default for TtcThresholds {
    fn default() -> Self {
        Self {
            threat_s: 0.5,
            critical_s: 1.5,
            care_s: 3.0,
            intent_s: 5.0,
            awareness_s: 10.0,
        }
    }
}

/// Condition and duration for leaving a state downwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellRule {
    /// TTC that must be exceeded; `None` means no human may be detected
    pub min_ttc_s: Option<f64>,
    /// How long the condition must hold without interruption (ms)
    pub sustain_ms: u64,
}

impl DwellRule {
    pub fn ttc_above(min_ttc_s: f64, sustain_ms: u64) -> Self {
        Self {
            min_ttc_s: Some(min_ttc_s),
            sustain_ms,
        }
    }

    pub fn no_detection(sustain_ms: u64) -> Self {
        Self {
            min_ttc_s: None,
            sustain_ms,
        }
    }

    pub fn sustain(&self) -> Duration {
        Duration::from_millis(self.sustain_ms)
    }
}

/// One rule per boundary, named by the state being left
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellTable {
    pub threat: DwellRule,
    pub critical: DwellRule,
    pub care: DwellRule,
    pub intent: DwellRule,
    pub awareness: DwellRule,
}

impl Default for DwellTable {
    fn default() -> Self {
        Self {
            threat: DwellRule::ttc_above(0.75, 2000),
            critical: DwellRule::ttc_above(1.5, 2000),
            care: DwellRule::ttc_above(2.5, 3000),
            intent: DwellRule::ttc_above(5.0, 2000),
            awareness: DwellRule::no_detection(10_000),
        }
    }
}

impl DwellTable {
    /// Rule for leaving `from` towards the next lower core state
    pub fn rule_for(&self, from: SafetyState) -> Option<&DwellRule> {
        match from {
            SafetyState::Threat => Some(&self.threat),
            SafetyState::Critical => Some(&self.critical),
            SafetyState::Care => Some(&self.care),
            SafetyState::Intent => Some(&self.intent),
            SafetyState::Awareness => Some(&self.awareness),
            SafetyState::Idle
            | SafetyState::MedConf
            | SafetyState::LowConf
            | SafetyState::Integrity => None,
        }
    }

    fn rules(&self) -> [(&'static str, &DwellRule); 5] {
        [
            ("threat", &self.threat),
            ("critical", &self.critical),
            ("care", &self.care),
            ("intent", &self.intent),
            ("awareness", &self.awareness),
        ]
    }
}

/// Decision engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// TTC to core-state mapping
    pub thresholds: TtcThresholds,
    /// De-escalation dwell requirements
    pub dwell: DwellTable,
    /// Confidence below this selects LOW_CONF
    pub low_confidence: f64,
    /// Confidence below this selects MED_CONF
    pub medium_confidence: f64,
    /// A detected human closer than this keeps at least AWARENESS (m)
    pub proximity_floor_m: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            thresholds: TtcThresholds::default(),
            dwell: DwellTable::default(),
            low_confidence: 0.60,
            medium_confidence: 0.80,
            proximity_floor_m: 1.5,
        }
    }
}

impl DecisionConfig {
    /// Longer dwell times and a wider proximity floor
    pub fn strict() -> Self {
        let base = DwellTable::default();
        Self {
            dwell: DwellTable {
                threat: DwellRule::ttc_above(1.0, 3000),
                critical: DwellRule::ttc_above(2.0, 3000),
                care: DwellRule::ttc_above(3.0, 4000),
                intent: DwellRule::ttc_above(6.0, 3000),
                awareness: DwellRule::no_detection(base.awareness.sustain_ms + 5000),
            },
            proximity_floor_m: 2.5,
            ..Default::default()
        }
    }

    /// Shorter dwell times and looser confidence thresholds
    pub fn lenient() -> Self {
        Self {
            dwell: DwellTable {
                threat: DwellRule::ttc_above(0.6, 1000),
                critical: DwellRule::ttc_above(1.5, 1000),
                care: DwellRule::ttc_above(3.0, 1500),
                intent: DwellRule::ttc_above(5.0, 1000),
                awareness: DwellRule::no_detection(5000),
            },
            low_confidence: 0.50,
            medium_confidence: 0.70,
            ..Default::default()
        }
    }

    /// Check internal consistency. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let ladder = [
            ("threat_s", t.threat_s),
            ("critical_s", t.critical_s),
            ("care_s", t.care_s),
            ("intent_s", t.intent_s),
            ("awareness_s", t.awareness_s),
        ];
        for (name, value) in ladder {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        for pair in ladder.windows(2) {
            if pair[0].1 >= pair[1].1 {
                return Err(ConfigError::UnorderedThresholds {
                    lower: pair[0].0,
                    upper: pair[1].0,
                });
            }
        }

        for (name, rule) in self.dwell.rules() {
            if rule.sustain_ms == 0 {
                return Err(ConfigError::InvalidDwell {
                    boundary: name,
                    reason: "sustain_ms must be positive".into(),
                });
            }
            if let Some(ttc) = rule.min_ttc_s {
                if !ttc.is_finite() || ttc < 0.0 {
                    return Err(ConfigError::InvalidDwell {
                        boundary: name,
                        reason: format!("min_ttc_s {} is not a valid TTC", ttc),
                    });
                }
            }
        }

        let valid = self.low_confidence > 0.0
            && self.low_confidence <= self.medium_confidence
            && self.medium_confidence <= 1.0;
        if !valid {
            return Err(ConfigError::InvalidConfidence {
                low: self.low_confidence,
                medium: self.medium_confidence,
            });
        }

        if !self.proximity_floor_m.is_finite() || self.proximity_floor_m < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "proximity_floor_m",
                value: self.proximity_floor_m,
            });
        }

        Ok(())
    }
}
