//! Role model
//!
//! Project roles form a configurable total order (lowest tier first). Every permission
//! check in the system is a single comparison against the tier configured for an
//! `AccessLevel`; there are no overlapping permission sets.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::AppError;

/// A project role, stored by tier name (upper case).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl AsRef<str>) -> Self {
        Role(name.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Role::new(name)
    }
}

/// Ordered set of tiers, lowest privilege first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    tiers: Vec<Role>,
}

impl RoleHierarchy {
    pub fn new<I, S>(tiers: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered: Vec<Role> = Vec::new();
        for tier in tiers {
            let role = Role::new(tier);
            if role.as_str().is_empty() {
                return Err(anyhow::anyhow!("role tier names cannot be empty"));
            }
            if ordered.contains(&role) {
                return Err(anyhow::anyhow!("role tier {} listed twice", role));
            }
            ordered.push(role);
        }
        if ordered.is_empty() {
            return Err(anyhow::anyhow!("at least one role tier is required"));
        }
        Ok(Self { tiers: ordered })
    }

    /// Position of a role in the order, `None` for roles outside the hierarchy
    pub fn rank(&self, role: &Role) -> Option<usize> {
        self.tiers.iter().position(|tier| tier == role)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.rank(role).is_some()
    }

    /// Highest tier; project creators receive it
    pub fn top(&self) -> &Role {
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn lowest(&self) -> &Role {
        &self.tiers[0]
    }

    pub fn tiers(&self) -> &[Role] {
        &self.tiers
    }

    /// Unknown roles never satisfy a threshold.
    pub fn at_least(&self, role: &Role, minimum: &Role) -> bool {
        match (self.rank(role), self.rank(minimum)) {
            (Some(have), Some(need)) => have >= need,
            _ => false,
        }
    }
}

/// Capability an operation requires, mapped to a minimum tier by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// Any membership
    Read,
    /// Create and edit files and messages
    Translate,
    /// Approve and reject messages
    Review,
    /// Project settings, members and deletions
    Administer,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessLevel::Read => "read",
            AccessLevel::Translate => "translate",
            AccessLevel::Review => "review",
            AccessLevel::Administer => "administer",
        };
        f.write_str(name)
    }
}

/// Role hierarchy plus the threshold tier of each access level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    hierarchy: RoleHierarchy,
    translate: Role,
    review: Role,
    administer: Role,
}

impl AccessPolicy {
    pub fn new(
        hierarchy: RoleHierarchy,
        translate: Role,
        review: Role,
        administer: Role,
    ) -> Result<Self, anyhow::Error> {
        for (label, role) in [
            ("translate", &translate),
            ("review", &review),
            ("administer", &administer),
        ] {
            if !hierarchy.contains(role) {
                return Err(anyhow::anyhow!(
                    "{} threshold {} is not a configured role tier",
                    label,
                    role
                ));
            }
        }
        if !(hierarchy.at_least(&review, &translate) && hierarchy.at_least(&administer, &review))
        {
            return Err(anyhow::anyhow!(
                "role thresholds must be ordered translate <= review <= administer"
            ));
        }
        Ok(Self {
            hierarchy,
            translate,
            review,
            administer,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let hierarchy = RoleHierarchy::new(config.role_tiers())?;
        Self::new(
            hierarchy,
            Role::new(config.role_translate()),
            Role::new(config.role_review()),
            Role::new(config.role_administer()),
        )
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    /// Threshold tier for an access level
    pub fn minimum(&self, level: AccessLevel) -> &Role {
        match level {
            AccessLevel::Read => self.hierarchy.lowest(),
            AccessLevel::Translate => &self.translate,
            AccessLevel::Review => &self.review,
            AccessLevel::Administer => &self.administer,
        }
    }

    pub fn permits(&self, role: &Role, level: AccessLevel) -> bool {
        self.hierarchy.at_least(role, self.minimum(level))
    }

    /// Membership absence and insufficient tier both deny with `Unauthorized`.
    pub fn authorize(&self, role: Option<&Role>, level: AccessLevel) -> Result<(), AppError> {
        self.admit(role.cloned(), level).map(|_| ())
    }

    /// Same check as `authorize`, handing back the admitted role.
    pub fn admit(&self, role: Option<Role>, level: AccessLevel) -> Result<Role, AppError> {
        match role {
            None => Err(AppError::Unauthorized(
                "user is not a member of this project".to_string(),
            )),
            Some(role) if self.permits(&role, level) => Ok(role),
            Some(role) => Err(AppError::Unauthorized(format!(
                "role {} is below the {} tier required to {}",
                role,
                self.minimum(level),
                level
            ))),
        }
    }

    /// Holders of the highest tier; a project must always keep one.
    pub fn is_top_tier(&self, role: &Role) -> bool {
        role == self.hierarchy.top()
    }

    /// Normalizes a requested role and checks it is a configured tier.
    pub fn assignable(&self, requested: &str) -> Result<Role, AppError> {
        let role = Role::new(requested);
        if self.hierarchy.contains(&role) {
            Ok(role)
        } else {
            Err(AppError::BusinessRuleViolation(format!(
                "role {} is not one of the configured tiers",
                role
            )))
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let hierarchy = RoleHierarchy {
            tiers: ["VIEWER", "TRANSLATOR", "REVIEWER", "LEAD", "ADMIN"]
                .iter()
                .map(Role::new)
                .collect(),
        };
        Self {
            hierarchy,
            translate: Role::new("TRANSLATOR"),
            review: Role::new("REVIEWER"),
            administer: Role::new("LEAD"),
        }
    }
}
