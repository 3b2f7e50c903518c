//! Renders the slot vector into the system prompt fed to the personality
//! layer: a dated header, an identity statement, and the numbered list of
//! occupied slots.

use chrono::{DateTime, Utc};
use mnemos_core::models::Principle;

fn bias_instruction(bias: f64) -> String {
    if bias <= 0.05 {
        "Weigh positively- and negatively-tagged past experience equally when deciding how to act."
            .to_string()
    } else if bias >= 0.95 {
        "Strongly favor courses of action that resemble your positively-tagged past experience, \
         even at the cost of ignoring some negatively-tagged precedent."
            .to_string()
    } else {
        format!(
            "Favor courses of action that resemble your positively-tagged past experience, \
             roughly {:.0}% more than you weigh negatively-tagged precedent.",
            bias * 100.0
        )
    }
}

/// Deterministic for a fixed `(slots, bias, now)` triple: same inputs
/// always render the same string, slot order preserved, empty slots
/// skipped entirely.
pub fn format_as_system_prompt(slots: &[Option<Principle>], good_behaviour_bias: f64, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Operating principles — as of {}\n\n", now.format("%Y-%m-%d")));
    out.push_str(
        "You are an assistant whose behavior is shaped by principles distilled from your own \
         past experience. Follow the numbered guidelines below.\n\n",
    );
    out.push_str(&bias_instruction(good_behaviour_bias));
    out.push_str("\n\n");

    let mut n = 0;
    for slot in slots.iter().flatten() {
        n += 1;
        out.push_str(&format!("{n}. {}\n", slot.text));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_slots_are_skipped_and_numbering_is_contiguous() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let slots = vec![
            Some(Principle::new_admin(1, "be honest")),
            None,
            Some(Principle::new_mined(3, "cite sources", 0.8)),
        ];
        let prompt = format_as_system_prompt(&slots, 0.5, now);
        assert!(prompt.contains("1. be honest"));
        assert!(prompt.contains("2. cite sources"));
        assert!(!prompt.contains("3."));
    }

    #[test]
    fn rendering_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let slots = vec![Some(Principle::new_admin(1, "be kind"))];
        assert_eq!(
            format_as_system_prompt(&slots, 0.2, now),
            format_as_system_prompt(&slots, 0.2, now)
        );
    }

    #[test]
    fn bias_wording_scales_with_value() {
        let now = Utc::now();
        let low = format_as_system_prompt(&[], 0.0, now);
        let high = format_as_system_prompt(&[], 1.0, now);
        assert!(low.contains("equally"));
        assert!(high.contains("Strongly favor"));
    }
}
