use crate::model::{CompanySettings, LeaveType};

pub const DEFAULT_SICK_THRESHOLD: u32 = 3;
pub const DEFAULT_PERSONAL_THRESHOLD: u32 = 1;

/// Auto-approval knobs taken from company settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoApprovePolicy {
    pub enabled: bool,
    pub sick_threshold: u32,
    pub personal_threshold: u32,
}

impl Default for AutoApprovePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            sick_threshold: DEFAULT_SICK_THRESHOLD,
            personal_threshold: DEFAULT_PERSONAL_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AutoApprove,
    NeedsReview,
}

impl AutoApprovePolicy {
    /// Unset or negative thresholds fall back to the defaults.
    pub fn from_settings(settings: &CompanySettings) -> Self {
        let threshold = |value: Option<i32>, default: u32| {
            value.and_then(|v| u32::try_from(v).ok()).unwrap_or(default)
        };

        Self {
            enabled: settings.auto_approve_enabled,
            sick_threshold: threshold(settings.auto_approve_sick_threshold, DEFAULT_SICK_THRESHOLD),
            personal_threshold: threshold(
                settings.auto_approve_personal_threshold,
                DEFAULT_PERSONAL_THRESHOLD,
            ),
        }
    }

    pub fn threshold(&self, leave_type: LeaveType) -> Option<u32> {
        match leave_type {
            LeaveType::Sick => Some(self.sick_threshold),
            LeaveType::Personal => Some(self.personal_threshold),
            _ => None,
        }
    }

    pub fn decide(&self, leave_type: LeaveType, business_days: u32) -> Decision {
        if !self.enabled || !leave_type.is_auto_approvable() {
            return Decision::NeedsReview;
        }

        match self.threshold(leave_type) {
            Some(limit) if business_days <= limit => Decision::AutoApprove,
            _ => Decision::NeedsReview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn enabled() -> AutoApprovePolicy {
        AutoApprovePolicy {
            enabled: true,
            ..AutoApprovePolicy::default()
        }
    }

    #[test]
    fn sick_leave_up_to_threshold_is_auto_approved() {
        let policy = enabled();
        assert_eq!(policy.decide(LeaveType::Sick, 3), Decision::AutoApprove);
        assert_eq!(policy.decide(LeaveType::Sick, 4), Decision::NeedsReview);
        assert_eq!(policy.decide(LeaveType::Personal, 1), Decision::AutoApprove);
        assert_eq!(policy.decide(LeaveType::Personal, 2), Decision::NeedsReview);
    }

    #[test]
    fn only_auto_approvable_types_skip_review() {
        let policy = AutoApprovePolicy {
            enabled: true,
            sick_threshold: 100,
            personal_threshold: 100,
        };
        for leave_type in LeaveType::iter() {
            let expected = if leave_type.is_auto_approvable() {
                Decision::AutoApprove
            } else {
                Decision::NeedsReview
            };
            assert_eq!(policy.decide(leave_type, 1), expected, "{leave_type}");
        }
    }

    #[test]
    fn disabled_policy_never_auto_approves() {
        assert_eq!(
            AutoApprovePolicy::default().decide(LeaveType::Sick, 1),
            Decision::NeedsReview
        );
    }

    #[test]
    fn settings_thresholds_override_defaults() {
        let settings = CompanySettings {
            auto_approve_enabled: true,
            auto_approve_sick_threshold: Some(5),
            auto_approve_personal_threshold: Some(-2),
            ..CompanySettings::default()
        };
        let policy = AutoApprovePolicy::from_settings(&settings);
        assert_eq!(policy.sick_threshold, 5);
        assert_eq!(policy.personal_threshold, DEFAULT_PERSONAL_THRESHOLD);
        assert!(policy.enabled);
    }
}
