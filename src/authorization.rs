//! Role gating for clinical operations.
//!
//! Rules, checked in order:
//! 1. Admin → every action
//! 2. Patient acting on their own linked record → own-record actions only
//! 3. Default → DENY

use serde::{Deserialize, Serialize};

use crate::models::{Role, User};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Operations the UI can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDashboard,
    ViewAllPatients,
    ManagePatients,
    ManageIncidents,
    ViewCalendar,
    /// Read a patient's record and appointments.
    ViewOwnRecords,
    /// Patient self-service profile edit.
    EditOwnProfile,
}

impl Action {
    /// Actions a Patient may perform on their own record.
    fn is_own_record_action(self) -> bool {
        matches!(self, Self::ViewOwnRecords | Self::EditOwnProfile)
    }
}

/// Why access was granted (or denied).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    AdminRole,
    OwnRecord,
    Denied,
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Authorization check
// ═══════════════════════════════════════════════════════════

/// Decide whether `user` may perform `action`. `target_patient` names the
/// patient record the action touches, when there is one.
pub fn authorize(user: &User, action: Action, target_patient: Option<&str>) -> AccessDecision {
    // Rule 1: Admin
    if user.role == Role::Admin {
        return AccessDecision::allow(AccessReason::AdminRole);
    }

    // Rule 2: Own record
    if action.is_own_record_action() {
        if let (Some(own), Some(target)) = (user.patient_id.as_deref(), target_patient) {
            if own == target {
                return AccessDecision::allow(AccessReason::OwnRecord);
            }
        }
    }

    // Rule 3: Default deny
    AccessDecision::deny()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
