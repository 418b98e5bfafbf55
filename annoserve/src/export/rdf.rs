//! Transliteration of standoff annotation files into RDF.
//!
//! The vocabulary is the fixed OntoMedia namespace set of the annotation
//! project. All lookup tables are static ordered slices so the rendering is
//! byte-for-byte deterministic for a given input.

use std::path::Path;

use tokio::fs;

use crate::errors::{Error, Result};

/// Base namespace under which annotation identifiers are minted.
pub const NAMESPACE: &str = "http://contextus.net/data/RRH/";

/// Prefix table emitted as the `@prefix` header (and as SPARQL `PREFIX`
/// clauses), in this order.
const NAMESPACES: &[(&str, &str)] = &[
    ("ome", "http://contextus.net/ontology/ontomedia/core/expression#"),
    ("omt", "http://contextus.net/ontology/ontomedia/ext/common/trait#"),
    ("omb", "http://contextus.net/ontology/ontomedia/ext/common/being#"),
    ("omeg", "http://contextus.net/ontology/ontomedia/ext/events/gain#"),
    ("omel", "http://contextus.net/ontology/ontomedia/ext/events/loss#"),
    ("omet", "http://contextus.net/ontology/ontomedia/ext/events/trans#"),
    ("omes", "http://contextus.net/ontology/ontomedia/ext/events/social#"),
    ("omea", "http://contextus.net/ontology/ontomedia/ext/events/action#"),
    ("omj", "http://contextus.net/ontology/ontomedia/ext/events/travel#"),
    ("eprop", "http://contextus.net/ontology/ontomedia/ext/events/eventprop#"),
    ("omf", "http://contextus.net/ontology/ontomedia/ext/fiction/fic#"),
];

/// Annotation categories and the prefix whose ontology defines them.
const CATEGORY_MAP: &[(&str, &str)] = &[
    ("Entity", "ome"),
    ("Being", "ome"),
    ("Character", "ome"),
    ("Item", "ome"),
    ("Abstract-Item", "ome"),
    ("Group", "omb"),
    ("Community", "omb"),
    ("Household", "omb"),
    ("Bonded-Group", "omb"),
    ("Bonded-Pair", "omb"),
    ("Organisation", "omb"),
    ("Company", "omb"),
    ("Government", "omb"),
    ("Context", "ome"),
    ("Physical-Item", "ome"),
    ("Space", "ome"),
    ("Event", "ome"),
    ("Gain", "ome"),
    ("Creation", "omeg"),
    ("Loss", "ome"),
    ("Destruction", "omel"),
    ("Betrayal", "omel"),
    ("Transformation", "ome"),
    ("Transference", "omet"),
    ("Division", "omet"),
    ("Merge", "omet"),
    ("Degradation", "omet"),
    ("Social", "ome"),
    ("Conversational", "omes"),
    ("Flirtation", "omes"),
    ("Proposition", "omes"),
    ("Political", "omes"),
    ("Academic", "omes"),
    ("Legal", "omes"),
    ("Theological", "omes"),
    ("Philosophical", "omes"),
    ("Action", "ome"),
    ("Violence", "omea"),
    ("Sex", "omea"),
    ("Festivity", "omea"),
    ("Ingestion", "omea"),
    ("Celestial", "omea"),
    ("Environmental", "omea"),
    ("Travel", "omj"),
    ("Describes", "omf"),
    ("Implied", "omf"),
    ("References-Concept", "omf"),
    ("In-Passing", "omf"),
    ("Vague-Description", "omf"),
    ("Detailed-Description", "omf"),
    ("Extremely-Detailed-Description", "omf"),
    ("Fade-To-Black", "omf"),
    ("Spoiler", "omf"),
    ("Key", "omf"),
    ("Main", "omf"),
    ("Fact", "omf"),
    ("Nitpick", "omf"),
    ("Consent-Given", "eprop"),
    ("Consent-Implied", "eprop"),
    ("Consent-Not-Given", "eprop"),
    ("Consent-Unclear", "eprop"),
];

const RELATIONSHIP_MAP: &[(&str, &str)] = &[
    ("is-linked-to", "ome"),
    ("is", "ome"),
    ("is-shadow-of", "ome"),
    ("contains", "ome"),
    ("contained-by", "ome"),
    ("has-subject-entity", "ome"),
    ("has-object-entity", "ome"),
    ("has-subject", "omes"),
    ("to", "ome"),
    ("from", "ome"),
];

/// Relationships that expand to a multi-line trait template instead of a
/// single predicate. `{1}` marks the entity slot.
const EXTENDED_RDF_MAP: &[(&str, &str)] = &[
    (
        "bond-with",
        "omt:has-trait [\n\ta omt:link ; [\n\t\ta omb:Bond;\n\t\tomb:has-bond {1}].\n\t].\n",
    ),
    (
        "family-of",
        "omt:has-trait [\n\ta omt:link ; [\n\t\ta omb:Family;\n\t\tomb:is-relation-of {1}].\n\t].\n",
    ),
];

fn table_get(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Resolve an annotation name to its RDF rendering.
///
/// Known namespaces resolve to their URL, categories and relationships to a
/// `prefix:name` term, and anything unknown passes through unchanged.
/// Extended relationships resolve to `None`; they need [`long_rdf`].
pub fn lookup(annotation: &str) -> Option<String> {
    if let Some(url) = table_get(NAMESPACES, annotation) {
        return Some(url.to_string());
    }
    if let Some(prefix) = table_get(CATEGORY_MAP, annotation) {
        return Some(format!("{prefix}:{annotation}"));
    }
    if let Some(prefix) = table_get(RELATIONSHIP_MAP, annotation) {
        return Some(format!("{prefix}:{annotation}"));
    }
    if table_get(EXTENDED_RDF_MAP, annotation).is_some() {
        return None;
    }
    Some(annotation.to_string())
}

/// Expand an extended relationship into its trait template, with the entity
/// rendered as a category term when known and a namespace URI otherwise.
pub fn long_rdf(annotation: &str, entity: &str) -> String {
    let ent = match table_get(CATEGORY_MAP, entity) {
        Some(prefix) => format!("{prefix}:{entity}"),
        None => format!("<{NAMESPACE}{entity}>"),
    };
    match table_get(EXTENDED_RDF_MAP, annotation) {
        Some(template) => template.replace("{1}", &ent),
        None => format!("{annotation} {ent}"),
    }
}

fn prefix_header() -> String {
    let mut rdf = String::new();
    for (prefix, url) in NAMESPACES {
        rdf.push_str(&format!("@prefix {prefix}: <{url}>.\n"));
    }
    rdf.push('\n');
    rdf
}

fn after_colon(chunk: &str) -> &str {
    chunk.split_once(':').map_or(chunk, |(_, rest)| rest)
}

fn before_colon(chunk: &str) -> &str {
    chunk.split_once(':').map_or(chunk, |(first, _)| first)
}

/// Render the triples for one annotation file, without the prefix header.
/// Lines are dispatched on their leading type letter; unknown lines are
/// skipped.
fn convert_lines(text: &str) -> String {
    let mut rdf = String::new();

    for line in text.lines() {
        let chunks: Vec<&str> = line.split_whitespace().collect();
        if chunks.is_empty() {
            continue;
        }

        match line.as_bytes()[0] {
            b'E' => {
                let Some(event) = chunks.get(1) else { continue };
                let event_id = after_colon(event);
                let event_type = before_colon(event);

                rdf.push_str(&format!("<{NAMESPACE}{event_id}>\n\ta "));
                if let Some(term) = lookup(event_type) {
                    rdf.push_str(&format!("{term};\n"));
                }
                for chunk in &chunks[2..] {
                    if let Some((role, filler)) = chunk.split_once(':') {
                        rdf.push_str(&format!("\t{role} <{NAMESPACE}{filler}>;\n"));
                    }
                }
                rdf.push_str(&format!("\trdf:label {} .\n\n", chunks[0]));
            }
            b'N' => {
                let (Some(old), Some(new)) = (chunks.get(3), chunks.get(4)) else {
                    continue;
                };
                rdf.push_str(&format!("<{NAMESPACE}{new}> owl:sameAs <{NAMESPACE}{old}>;\n"));
                rdf.push_str(&format!("\trdf:seeAlso {NAMESPACE}{} .\n\n", chunks[0]));
            }
            b'R' => {
                let (Some(relation), Some(arg1), Some(arg2)) = (chunks.get(1), chunks.get(2), chunks.get(3))
                else {
                    continue;
                };
                rdf.push_str(&format!("<{NAMESPACE}{}> ", after_colon(arg1)));
                match lookup(relation) {
                    Some(term) => {
                        rdf.push_str(&format!("{term} <{NAMESPACE}{}>;\n", after_colon(arg2)));
                    }
                    None => rdf.push_str(&long_rdf(relation, after_colon(arg2))),
                }
                rdf.push_str(&format!("\trdf:label '{}' .\n\n", chunks[0]));
            }
            b'T' => {
                let Some(category) = chunks.get(1) else { continue };
                rdf.push_str(&format!("<{NAMESPACE}{}>\n\ta <", chunks[0]));
                if let Some(term) = lookup(category) {
                    rdf.push_str(&term);
                    rdf.push_str(&format!("{{{category}}}"));
                }
                rdf.push_str("> .\n\n");
            }
            b'A' => {
                let (Some(target), Some(value)) = (chunks.get(2), chunks.get(3)) else {
                    continue;
                };
                let term = lookup(value).unwrap_or_else(|| (*value).to_string());
                rdf.push_str(&format!("<{NAMESPACE}{target}>\n\ta <{term}>;\n"));
                rdf.push_str(&format!("\trdf:label '{}' .\n\n", chunks[0]));
            }
            _ => {}
        }
    }

    rdf
}

/// Render a full RDF document (prefix header plus triples) for the
/// annotation file at `path`.
pub async fn convert_to_rdf(path: &Path) -> Result<String> {
    let text = read_annotation_file(path).await?;
    let mut rdf = prefix_header();
    rdf.push_str(&convert_lines(&text));
    Ok(rdf)
}

/// The two pieces a SPARQL `INSERT DATA` statement needs: `PREFIX` clauses
/// (without the `@prefix`/dot decoration) and the bare triples.
pub struct RdfParts {
    pub prefixes: Vec<String>,
    pub data: String,
}

pub async fn rdf_parts(path: &Path) -> Result<RdfParts> {
    let text = read_annotation_file(path).await?;
    let prefixes = NAMESPACES
        .iter()
        .map(|(prefix, url)| format!("{prefix}: <{url}>"))
        .collect();
    Ok(RdfParts {
        prefixes,
        data: convert_lines(&text),
    })
}

async fn read_annotation_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                resource: "document".to_string(),
                id: path.display().to_string(),
            }
        } else {
            Error::Internal {
                operation: format!("read annotation file {}: {e}", path.display()),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_each_table() {
        assert_eq!(
            lookup("ome").as_deref(),
            Some("http://contextus.net/ontology/ontomedia/core/expression#")
        );
        assert_eq!(lookup("Character").as_deref(), Some("ome:Character"));
        assert_eq!(lookup("Creation").as_deref(), Some("omeg:Creation"));
        assert_eq!(lookup("is-linked-to").as_deref(), Some("ome:is-linked-to"));
        assert_eq!(lookup("bond-with"), None);
        assert_eq!(lookup("Unmapped-Term").as_deref(), Some("Unmapped-Term"));
    }

    #[test]
    fn long_rdf_expands_the_trait_template() {
        let expanded = long_rdf("bond-with", "Character");
        assert!(expanded.starts_with("omt:has-trait ["));
        assert!(expanded.contains("omb:has-bond ome:Character]"));

        let unmapped = long_rdf("bond-with", "X17");
        assert!(unmapped.contains(&format!("omb:has-bond <{NAMESPACE}X17>]")));
    }

    #[test]
    fn header_lists_all_prefixes_in_order() {
        let header = prefix_header();
        let first = header.lines().next().unwrap();
        assert_eq!(
            first,
            "@prefix ome: <http://contextus.net/ontology/ontomedia/core/expression#>.",
        );
        assert_eq!(header.lines().filter(|l| !l.is_empty()).count(), NAMESPACES.len());
        assert!(header.ends_with(">.\n\n"));
    }

    #[test]
    fn entity_and_relation_lines_render_deterministically() {
        let input = "T1\tCharacter 0 5\tAlice\nR1\tis Arg1:T1 Arg2:T2\n";
        let expected = format!(
            "<{NAMESPACE}T1>\n\ta <ome:Character{{Character}}> .\n\n\
             <{NAMESPACE}T1> ome:is <{NAMESPACE}T2>;\n\trdf:label 'R1' .\n\n"
        );
        assert_eq!(convert_lines(input), expected);
        // Same input, same bytes.
        assert_eq!(convert_lines(input), convert_lines(input));
    }

    #[test]
    fn event_lines_carry_role_fillers() {
        let out = convert_lines("E1\tViolence:E1 Agent:T1 Patient:T2\n");
        assert!(out.starts_with(&format!("<{NAMESPACE}E1>\n\ta omea:Violence;\n")));
        assert!(out.contains(&format!("\tAgent <{NAMESPACE}T1>;\n")));
        assert!(out.contains(&format!("\tPatient <{NAMESPACE}T2>;\n")));
        assert!(out.ends_with("\trdf:label E1 .\n\n"));
    }

    #[test]
    fn extended_relations_use_the_long_form() {
        let out = convert_lines("R2\tbond-with Arg1:T1 Arg2:T2\n");
        assert!(out.contains("omt:has-trait ["));
        assert!(out.contains(&format!("omb:has-bond <{NAMESPACE}T2>]")));
    }

    #[test]
    fn unknown_lines_are_skipped() {
        assert_eq!(convert_lines("# comment\n\nX unknown line\n"), "");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = convert_to_rdf(Path::new("/nonexistent/doc.ann")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn parts_split_prefixes_from_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.ann");
        std::fs::write(&path, "T1\tCharacter 0 5\tAlice\n").unwrap();

        let parts = rdf_parts(&path).await.unwrap();
        assert_eq!(parts.prefixes.len(), NAMESPACES.len());
        assert_eq!(
            parts.prefixes[0],
            "ome: <http://contextus.net/ontology/ontomedia/core/expression#>"
        );
        assert!(!parts.data.contains("@prefix"));
        assert!(parts.data.contains(&format!("<{NAMESPACE}T1>")));
    }
}
