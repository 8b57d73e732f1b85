use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// process-wide catalog of the queryable relations
pub static CATALOG: Lazy<SchemaCatalog> = Lazy::new(SchemaCatalog::scisci);

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub description: &'static str,
    /// user-facing name of what this column lets people ask about
    #[serde(skip)]
    pub concept: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: &'static str,
    pub description: &'static str,
    pub columns: Vec<Column>,
}

/// the `describe()` view of a single table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescription {
    pub columns: Vec<&'static str>,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaCatalog {
    tables: Vec<Table>,
}

const fn column(
    name: &'static str,
    sql_type: &'static str,
    description: &'static str,
    concept: Option<&'static str>,
) -> Column {
    Column {
        name,
        sql_type,
        description,
        concept,
    }
}

impl SchemaCatalog {
    /// papers, authors and the junction relation linking them
    pub fn scisci() -> Self {
        let papers = Table {
            name: "papers",
            description: "Contains paper information including id, title, publication year, research field, and citation count",
            columns: vec![
                column("id", "VARCHAR", "Unique paper identifier", None),
                column("title", "TEXT", "Paper title", Some("paper titles")),
                column("year", "INTEGER", "Publication year", Some("years")),
                column("field", "VARCHAR", "Research field", Some("research fields")),
                column("citation_count", "INTEGER", "Number of citations", Some("citation counts")),
            ],
        };

        let authors = Table {
            name: "authors",
            description: "Contains author information including id, name, and affiliation",
            columns: vec![
                column("id", "VARCHAR", "Unique author identifier", None),
                column("name", "VARCHAR", "Author name", Some("author names and affiliations")),
                column("affiliation", "VARCHAR", "Author's institution", Some("author names and affiliations")),
            ],
        };

        let author_paper = Table {
            name: "author_paper",
            description: "Junction table linking authors to papers",
            columns: vec![
                column("author_id", "VARCHAR", "Foreign key to authors.id", None),
                column("paper_id", "VARCHAR", "Foreign key to papers.id", None),
            ],
        };

        Self {
            tables: vec![papers, authors, author_paper],
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn describe(&self) -> BTreeMap<&'static str, TableDescription> {
        self.tables
            .iter()
            .map(|table| {
                let description = TableDescription {
                    columns: table.columns.iter().map(|c| c.name).collect(),
                    description: table.description,
                };
                (table.name, description)
            })
            .collect()
    }

    /// distinct user-facing concepts in declaration order
    pub fn supported_concepts(&self) -> Vec<&'static str> {
        let mut concepts: Vec<&'static str> = Vec::new();

        for concept in self
            .tables
            .iter()
            .flat_map(|t| t.columns.iter())
            .filter_map(|c| c.concept)
        {
            if !concepts.contains(&concept) {
                concepts.push(concept);
            }
        }

        concepts
    }

    /// the concepts joined as an english list, e.g. "a, b, and c"
    pub fn supported_concepts_sentence(&self) -> String {
        let concepts = self.supported_concepts();

        match concepts.as_slice() {
            [] => String::new(),
            [only] => only.to_string(),
            [first, second] => format!("{} and {}", first, second),
            [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
        }
    }
}
