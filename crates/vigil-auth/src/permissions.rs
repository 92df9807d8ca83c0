use vigil_core::enums::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadClinical,
    WriteClinical,
    ManageUsers,
    ReadAudit,
    ExportData,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadClinical => "read_clinical",
            Permission::WriteClinical => "write_clinical",
            Permission::ManageUsers => "manage_users",
            Permission::ReadAudit => "read_audit",
            Permission::ExportData => "export_data",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait RoleExt {
    fn allows(&self, permission: Permission) -> bool;
}

impl RoleExt for Role {
    fn allows(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Role::Admin => true,
            Role::Clinician => matches!(permission, ReadClinical | WriteClinical | ExportData),
            Role::Viewer => permission == ReadClinical,
        }
    }
}
