//! The subset of the `eve-sde-to-sqlite` schema the planner reads

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self { name, col_type }
    }
}

/// A table and the columns queried from it
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

pub static TYPES: TableSchema = TableSchema {
    name: "types",
    columns: &[
        Column::new("id", ColumnType::Integer),
        Column::new("name_en", ColumnType::Text),
        Column::new("volume", ColumnType::Real),
        Column::new("packaged_volume", ColumnType::Real),
    ],
};

pub static BLUEPRINTS: TableSchema = TableSchema {
    name: "blueprints",
    columns: &[
        Column::new("id", ColumnType::Integer),
        Column::new("max_production_limit", ColumnType::Integer),
        Column::new("manufacturing_time", ColumnType::Integer),
        Column::new("reaction_time", ColumnType::Integer),
    ],
};

pub static BLUEPRINT_MATERIALS: TableSchema = TableSchema {
    name: "blueprint_materials",
    columns: &[
        Column::new("blueprint_id", ColumnType::Integer),
        Column::new("activity", ColumnType::Text),
        Column::new("type_id", ColumnType::Integer),
        Column::new("quantity", ColumnType::Integer),
    ],
};

pub static BLUEPRINT_PRODUCTS: TableSchema = TableSchema {
    name: "blueprint_products",
    columns: &[
        Column::new("blueprint_id", ColumnType::Integer),
        Column::new("activity", ColumnType::Text),
        Column::new("type_id", ColumnType::Integer),
        Column::new("quantity", ColumnType::Integer),
    ],
};

pub static MAP_SOLAR_SYSTEMS: TableSchema = TableSchema {
    name: "map_solar_systems",
    columns: &[
        Column::new("id", ColumnType::Integer),
        Column::new("name_en", ColumnType::Text),
        Column::new("position_x", ColumnType::Real),
        Column::new("position_y", ColumnType::Real),
        Column::new("position_z", ColumnType::Real),
    ],
};

/// Every table the planner queries
pub static REQUIRED_TABLES: &[&TableSchema] = &[
    &TYPES,
    &BLUEPRINTS,
    &BLUEPRINT_MATERIALS,
    &BLUEPRINT_PRODUCTS,
    &MAP_SOLAR_SYSTEMS,
];

/// CREATE TABLE statement with just the planner's columns
pub fn generate_create_table(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            let pk = if col.name == "id" { " PRIMARY KEY" } else { "" };
            format!("    {} {}{}", col.name, col.col_type.sql(), pk)
        })
        .collect();

    format!("CREATE TABLE {} (\n{}\n)", schema.name, columns.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&BLUEPRINTS);
        assert!(sql.starts_with("CREATE TABLE blueprints"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("reaction_time INTEGER"));
    }

    #[test]
    fn test_junction_tables_have_no_primary_key() {
        let sql = generate_create_table(&BLUEPRINT_PRODUCTS);
        assert!(!sql.contains("PRIMARY KEY"));
    }
}
