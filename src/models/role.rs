//! Recruitment roles and the per-role open-slot counters.

use serde::{Deserialize, Serialize};

/// Fixed category of contribution a member is recruited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Frontend,
    Backend,
    Devops,
    FullStack,
    DataEngineer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Frontend,
        Role::Backend,
        Role::Devops,
        Role::FullStack,
        Role::DataEngineer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Frontend => "FRONTEND",
            Role::Backend => "BACKEND",
            Role::Devops => "DEVOPS",
            Role::FullStack => "FULL_STACK",
            Role::DataEngineer => "DATA_ENGINEER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FRONTEND" => Some(Role::Frontend),
            "BACKEND" => Some(Role::Backend),
            "DEVOPS" => Some(Role::Devops),
            "FULL_STACK" => Some(Role::FullStack),
            "DATA_ENGINEER" => Some(Role::DataEngineer),
            _ => None,
        }
    }

    /// Column on `teams` holding this role's open-slot counter.
    pub fn counter_column(&self) -> &'static str {
        match self {
            Role::Frontend => "frontend_num",
            Role::Backend => "backend_num",
            Role::Devops => "devops_num",
            Role::FullStack => "full_stack_num",
            Role::DataEngineer => "data_engineer_num",
        }
    }
}

/// Remaining open slots per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitmentCounters {
    #[serde(default)]
    pub frontend_num: i64,
    #[serde(default)]
    pub backend_num: i64,
    #[serde(default)]
    pub devops_num: i64,
    #[serde(default)]
    pub full_stack_num: i64,
    #[serde(default)]
    pub data_engineer_num: i64,
}

impl RecruitmentCounters {
    pub fn get(&self, role: Role) -> i64 {
        match role {
            Role::Frontend => self.frontend_num,
            Role::Backend => self.backend_num,
            Role::Devops => self.devops_num,
            Role::FullStack => self.full_stack_num,
            Role::DataEngineer => self.data_engineer_num,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut i64 {
        match role {
            Role::Frontend => &mut self.frontend_num,
            Role::Backend => &mut self.backend_num,
            Role::Devops => &mut self.devops_num,
            Role::FullStack => &mut self.full_stack_num,
            Role::DataEngineer => &mut self.data_engineer_num,
        }
    }

    pub fn total(&self) -> i64 {
        Role::ALL.iter().map(|role| self.get(*role)).sum()
    }
}
