use serde::Serialize;

/// Compact color + label summary of a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub color: &'static str,
    pub text: &'static str,
}

/// Map an overall score to its badge.
///
/// Boundary values belong to the lower bracket: 80 is "good", 60 is
/// "needs-improvement".
pub fn label(score: f64) -> Badge {
    if score > 80.0 {
        Badge {
            color: "brightgreen",
            text: "excellent",
        }
    } else if score > 60.0 {
        Badge {
            color: "yellow",
            text: "good",
        }
    } else {
        Badge {
            color: "red",
            text: "needs-improvement",
        }
    }
}

/// shields.io endpoint document for a badge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldsEndpoint {
    pub schema_version: u8,
    pub label: String,
    pub message: String,
    pub color: String,
}

impl Badge {
    pub fn to_endpoint(&self, label: &str) -> ShieldsEndpoint {
        ShieldsEndpoint {
            schema_version: 1,
            label: label.to_string(),
            message: self.text.to_string(),
            color: self.color.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_brackets() {
        assert_eq!(
            label(83.5),
            Badge {
                color: "brightgreen",
                text: "excellent"
            }
        );
        assert_eq!(
            label(65.0),
            Badge {
                color: "yellow",
                text: "good"
            }
        );
        assert_eq!(
            label(50.0),
            Badge {
                color: "red",
                text: "needs-improvement"
            }
        );
    }

    #[test]
    fn test_boundaries_fall_to_lower_bracket() {
        assert_eq!(label(80.0).text, "good");
        assert_eq!(label(80.0001).text, "excellent");
        assert_eq!(label(60.0).text, "needs-improvement");
        assert_eq!(label(60.0001).text, "good");
    }

    #[test]
    fn test_extremes() {
        assert_eq!(label(100.0).color, "brightgreen");
        assert_eq!(label(0.0).color, "red");
    }

    #[test]
    fn test_endpoint_json_shape() {
        let json = serde_json::to_value(label(83.5).to_endpoint("health")).unwrap();
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["label"], "health");
        assert_eq!(json["message"], "excellent");
        assert_eq!(json["color"], "brightgreen");
    }
}
