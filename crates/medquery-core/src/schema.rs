//! Static schema catalog for the hospital operations store.
//!
//! One descriptor per table, loaded once at process start and shared
//! read-only. The DDL is written in the store's native dialect so the same
//! catalog feeds both the table-selection prompt and store provisioning.

use serde::{Deserialize, Serialize};

/// One table: its name and the DDL that creates it.
///
/// Wire names match the table-selection contract: the selector returns a
/// JSON list of `{"table": ..., "schema": ...}` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDescriptor {
    #[serde(rename = "table")]
    pub table_name: String,
    #[serde(rename = "schema")]
    pub ddl: String,
}

/// Ordered, immutable collection of every table in the store.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    tables: Vec<TableDescriptor>,
}

impl SchemaCatalog {
    /// The built-in hospital operations schema.
    pub fn builtin() -> Self {
        let tables = BUILTIN_TABLES
            .iter()
            .map(|(name, ddl)| TableDescriptor {
                table_name: (*name).to_string(),
                ddl: (*ddl).to_string(),
            })
            .collect();
        Self { tables }
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serialize the full catalog for embedding in a system prompt.
    pub fn to_prompt(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push('`');
            out.push_str(&table.table_name);
            out.push_str("`\n");
            out.push_str(&table.ddl);
            out.push_str("\n---\n");
        }
        out
    }

    /// All DDL statements as one script, for store (re)provisioning.
    pub fn provisioning_script(&self) -> String {
        self.tables
            .iter()
            .map(|t| t.ddl.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

const BUILTIN_TABLES: &[(&str, &str)] = &[
    (
        "providers",
        "CREATE TABLE providers (
    provider_id INTEGER PRIMARY KEY,
    npi VARCHAR(20) UNIQUE NOT NULL,
    first_name VARCHAR(100),
    last_name VARCHAR(100),
    specialty VARCHAR(100),
    email VARCHAR(150),
    phone VARCHAR(20),
    hire_date DATE,
    status VARCHAR(50),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "hospitals",
        "CREATE TABLE hospitals (
    hospital_id INTEGER PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    address TEXT,
    city VARCHAR(100),
    state VARCHAR(50),
    zip_code VARCHAR(10),
    hospital_type VARCHAR(50),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "departments",
        "CREATE TABLE departments (
    department_id INTEGER PRIMARY KEY,
    hospital_id INTEGER,
    name VARCHAR(100),
    department_code VARCHAR(50),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "sites",
        "CREATE TABLE sites (
    site_id INTEGER PRIMARY KEY,
    hospital_id INTEGER,
    name VARCHAR(100),
    level_of_service VARCHAR(50),
    location_desc TEXT,
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "patients",
        "CREATE TABLE patients (
    patient_id INTEGER PRIMARY KEY,
    first_name VARCHAR(100),
    last_name VARCHAR(100),
    dob DATE,
    gender VARCHAR(20),
    contact_phone VARCHAR(20),
    insurance_provider VARCHAR(100),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "provider_assignments",
        "CREATE TABLE provider_assignments (
    assignment_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    department_id INTEGER,
    start_date DATE,
    end_date DATE,
    status VARCHAR(50),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "shifts",
        "CREATE TABLE shifts (
    shift_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    hospital_id INTEGER,
    department_id INTEGER,
    shift_start TIMESTAMP,
    shift_end TIMESTAMP,
    shift_type VARCHAR(50),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "encounters",
        "CREATE TABLE encounters (
    encounter_id INTEGER PRIMARY KEY,
    patient_id INTEGER,
    provider_id INTEGER,
    hospital_id INTEGER,
    department_id INTEGER,
    site_id INTEGER,
    encounter_date TIMESTAMP,
    chief_complaint TEXT,
    diagnosis_code VARCHAR(20),
    discharge_disposition VARCHAR(100),
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "performance_targets",
        "CREATE TABLE performance_targets (
    target_id INTEGER PRIMARY KEY,
    department_id INTEGER,
    metric_name VARCHAR(100),
    target_value NUMERIC(10, 2),
    unit VARCHAR(20),
    period_start DATE,
    period_end DATE,
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "provider_metrics",
        "CREATE TABLE provider_metrics (
    metric_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    metric_name VARCHAR(100),
    metric_value NUMERIC(10, 2),
    unit VARCHAR(20),
    report_date DATE,
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "hospital_admins",
        "CREATE TABLE hospital_admins (
    admin_id INTEGER PRIMARY KEY,
    user_name VARCHAR(100),
    email VARCHAR(150),
    hospital_id INTEGER,
    role VARCHAR(50),
    is_active BOOLEAN,
    created_at TIMESTAMP,
    updated_at TIMESTAMP
);",
    ),
    (
        "audit_logs",
        "CREATE TABLE audit_logs (
    log_id INTEGER PRIMARY KEY,
    user_id INTEGER,
    action VARCHAR(100),
    entity_type VARCHAR(50),
    entity_id INTEGER,
    timestamp TIMESTAMP,
    details TEXT
);",
    ),
    (
        "diagnosis_codes",
        "CREATE TABLE diagnosis_codes (
    code VARCHAR(20) PRIMARY KEY,
    description TEXT,
    icd_version VARCHAR(10)
);",
    ),
    (
        "shift_types",
        "CREATE TABLE shift_types (
    type_id INTEGER PRIMARY KEY,
    name VARCHAR(50),
    description TEXT
);",
    ),
    (
        "site_departments",
        "CREATE TABLE site_departments (
    id INTEGER PRIMARY KEY,
    site_id INTEGER,
    department_id INTEGER,
    created_at TIMESTAMP
);",
    ),
    (
        "hospital_contacts",
        "CREATE TABLE hospital_contacts (
    contact_id INTEGER PRIMARY KEY,
    hospital_id INTEGER,
    name VARCHAR(100),
    role VARCHAR(100),
    email VARCHAR(150),
    phone VARCHAR(20)
);",
    ),
    (
        "provider_specialties",
        "CREATE TABLE provider_specialties (
    specialty_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    specialty_name VARCHAR(100)
);",
    ),
    (
        "provider_feedback",
        "CREATE TABLE provider_feedback (
    feedback_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    encounter_id INTEGER,
    rating INTEGER,
    comment TEXT,
    submitted_at TIMESTAMP
);",
    ),
    (
        "provider_leaves",
        "CREATE TABLE provider_leaves (
    leave_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    start_date DATE,
    end_date DATE,
    reason TEXT,
    approved_by INTEGER,
    created_at TIMESTAMP
);",
    ),
    (
        "document_uploads",
        "CREATE TABLE document_uploads (
    doc_id INTEGER PRIMARY KEY,
    provider_id INTEGER,
    file_name VARCHAR(255),
    file_type VARCHAR(50),
    uploaded_at TIMESTAMP,
    uploaded_by INTEGER
);",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_complete_and_ordered() {
        let catalog = SchemaCatalog::builtin();
        assert_eq!(catalog.len(), 20);
        assert_eq!(catalog.tables()[0].table_name, "providers");
        assert_eq!(catalog.tables()[19].table_name, "document_uploads");
    }

    #[test]
    fn prompt_serialization_includes_every_table() {
        let catalog = SchemaCatalog::builtin();
        let prompt = catalog.to_prompt();
        for table in catalog.tables() {
            assert!(prompt.contains(&format!("`{}`", table.table_name)));
            assert!(prompt.contains(&table.ddl));
        }
    }

    #[test]
    fn provisioning_script_contains_one_create_per_table() {
        let catalog = SchemaCatalog::builtin();
        let script = catalog.provisioning_script();
        assert_eq!(script.matches("CREATE TABLE").count(), catalog.len());
    }

    #[test]
    fn descriptor_wire_format_uses_table_and_schema_keys() {
        let descriptor = TableDescriptor {
            table_name: "providers".to_string(),
            ddl: "CREATE TABLE providers (provider_id INTEGER);".to_string(),
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert!(json.get("table").is_some());
        assert!(json.get("schema").is_some());
    }
}
