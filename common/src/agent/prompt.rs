use crate::agent::parser::SCHEMA_VIOLATION_SENTINEL;
use crate::llm::model::Message;
use crate::schema::SchemaCatalog;

pub const SYSTEM_PROMPT: &str =
    "You are a data analysis assistant for the SciSciNet paper database. \
     You help users analyze academic papers by generating SQL queries and visualizations. \
     Always be helpful and provide clear explanations of the data.";

pub const VEGA_GENERATION_PROMPT: &str = r##"Based on the SQL query results, generate a Vega-Lite JSON specification for visualization.

Analyze the data structure and choose the most appropriate chart type.

Available chart types:
- Bar: categorical comparisons, counts, rankings (horizontal for long labels or top N)
- Line: time series, trends over time
- Scatter: correlations between two quantitative variables
- Pie/Donut (arc mark): part-to-whole relationships
- Area: cumulative values over time
- Stacked bar: multi-category comparisons
- Heatmap (rect mark): two-dimensional data

Selection hints:
- a year field usually means a line or area chart
- categorical counts usually mean a bar chart
- two quantitative fields usually mean a scatter plot
- multiple categories over time mean a stacked bar or multi-line chart

Requirements:
- top-level keys: "$schema", "data", "mark", "encoding", "title", "width", "height"
- "data" must be {"values": [...]}
- width between 800 and 1200, height between 400 and 600 (pie charts may be 400x400)
- use meaningful axis titles and map fields that exist in the results
- return ONLY valid JSON, no markdown and no explanation

Example:
{
  "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
  "data": {"values": [...]},
  "mark": {"type": "line", "point": true},
  "encoding": {
    "x": {"field": "year", "type": "ordinal", "axis": {"title": "Year"}},
    "y": {"field": "count", "type": "quantitative", "axis": {"title": "Count"}}
  },
  "title": "Trend Over Time",
  "width": 800,
  "height": 400
}"##;

pub const ANALYSIS_PROMPT: &str = "Analyze the query results and provide a clear, concise explanation. \
     Summarize key findings and highlight interesting patterns or trends. \
     Keep it brief (2-3 sentences), use plain language rather than technical jargon, \
     and be specific with numbers and facts.";

/// render the catalog as the schema section of the generation context
pub fn database_schema_prompt(catalog: &SchemaCatalog) -> String {
    let mut text = String::from("The database contains the following tables:\n");

    for (idx, table) in catalog.tables().iter().enumerate() {
        text.push_str(&format!("\n{}. {}\n", idx + 1, table.name));
        for column in &table.columns {
            text.push_str(&format!(
                "   - {} ({}): {}\n",
                column.name, column.sql_type, column.description
            ));
        }
    }

    text.push_str(
        "\nauthor_paper is a junction table linking authors to their papers. \
         One paper can have multiple authors.",
    );
    text
}

pub fn sql_generation_prompt(catalog: &SchemaCatalog) -> String {
    let fields = catalog
        .tables()
        .iter()
        .map(|t| {
            let names: Vec<&str> = t.columns.iter().map(|c| c.name).collect();
            format!("- {}: {}", t.name, names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the user's question, generate a SQL query to retrieve the relevant data.\n\n\
         IMPORTANT: Only generate SQL for fields that exist in the database schema. \
         If the user asks about fields that don't exist (like keywords, abstract, journal), \
         return \"{sentinel}\" instead of a SQL query.\n\n\
         Available fields ONLY:\n{fields}\n\n\
         Guidelines:\n\
         - Use JOIN when data from multiple tables is needed\n\
         - Use GROUP BY for aggregations and ORDER BY to sort results logically\n\
         - Limit results to reasonable numbers (e.g. LIMIT 10, LIMIT 20)\n\
         - Use standard SQL compatible with PostgreSQL\n\
         - Only read data: never modify tables or schema\n\
         - Return only the SQL query without any explanation\n\n\
         Examples:\n\
         Q: Show me papers by year\n\
         SQL: SELECT year, COUNT(*) as count FROM papers GROUP BY year ORDER BY year\n\n\
         Q: Top 10 authors by publication count\n\
         SQL: SELECT a.name, COUNT(ap.paper_id) as paper_count FROM authors a \
         JOIN author_paper ap ON a.id = ap.author_id GROUP BY a.id, a.name \
         ORDER BY paper_count DESC LIMIT 10\n\n\
         Q: Papers in each field\n\
         SQL: SELECT field, COUNT(*) as count FROM papers GROUP BY field ORDER BY count DESC\n\n\
         Q: Show me papers with keywords\n\
         {sentinel}\n\n\
         Q: Papers by journal\n\
         {sentinel}",
        sentinel = SCHEMA_VIOLATION_SENTINEL,
        fields = fields,
    )
}

/// fixed instruction context followed by the user's question
pub fn build_generation_messages(catalog: &SchemaCatalog, question: &str) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::system(database_schema_prompt(catalog)),
        Message::system(sql_generation_prompt(catalog)),
        Message::user(format!("Generate SQL for: {}", question)),
    ]
}

pub fn build_chart_messages(question: &str, sql: &str, results_json: &str) -> Vec<Message> {
    vec![
        Message::system(VEGA_GENERATION_PROMPT),
        Message::user(format!(
            "User question: {}\nSQL query: {}\nResults: {}\n\n\
             Generate a Vega-Lite spec for this data.",
            question, sql, results_json
        )),
    ]
}

pub fn build_analysis_messages(question: &str, sample_json: &str) -> Vec<Message> {
    vec![
        Message::system(ANALYSIS_PROMPT),
        Message::user(format!(
            "User question: {}\nData: {}\n\nProvide a brief analysis.",
            question, sample_json
        )),
    ]
}
