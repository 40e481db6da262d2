use tabled::{settings::Style, Table, Tabled};
use crate::schema::PropertyDescriptor;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Records")]
    count: u64,
}

#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "Property")]
    name: &'static str,
    #[tabled(rename = "Type")]
    type_name: String,
}

/// Per-type record counts as a rounded table; empty input renders nothing
pub fn count_table<'a>(counts: impl IntoIterator<Item = (&'a str, u64)>) -> String {
    let rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(type_name, count)| CountRow {
            type_name: type_name.to_string(),
            count,
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

/// Property list of one type; generic containers show their arguments
pub fn property_table(properties: &[PropertyDescriptor]) -> String {
    let rows: Vec<PropertyRow> = properties
        .iter()
        .map(|p| PropertyRow {
            name: p.name,
            type_name: if p.is_generic {
                format!("{}<{}>", p.type_name, p.generic_arguments.join(", "))
            } else {
                p.type_name.to_string()
            },
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::registry;

    #[test]
    fn test_count_table_lists_types() {
        let rendered = count_table([("User", 1), ("Position", 6)]);
        assert!(rendered.contains("User"));
        assert!(rendered.contains("Records"));
        assert!(count_table(Vec::<(&str, u64)>::new()).is_empty());
    }

    #[test]
    fn test_property_table_shows_generic_arguments() {
        let rendered = property_table(registry::WORKSPACE_DATA.properties);
        assert!(rendered.contains("List`1<WorkspaceObject>"));
        assert!(rendered.contains("MethodName"));
    }
}
