//! Tantivy-based search index module.
//!
//! Holds two document kinds, team postings and member profiles, in one index.
//! Writes happen after the database commit and are best-effort.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{Member, Role, TeamDetail};

/// Field boost values.
const BOOST_TITLE: f32 = 10.0;
const BOOST_STACKS: f32 = 6.0;
const BOOST_BODY: f32 = 4.0;

/// Deepest hit a search may page to.
const MAX_SEARCH_WINDOW: usize = 10_000;

/// Document kinds held by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Team,
    Member,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Team => "team",
            IndexKind::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "team" => Some(IndexKind::Team),
            "member" => Some(IndexKind::Member),
            _ => None,
        }
    }
}

/// Searchable view of a team posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDocument {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub stacks: Vec<String>,
    pub open_roles: Vec<Role>,
}

impl From<&TeamDetail> for TeamDocument {
    fn from(detail: &TeamDetail) -> Self {
        let team = &detail.team;
        Self {
            id: team.id,
            name: team.name.clone(),
            description: team.description.clone(),
            stacks: detail.stacks.iter().map(|s| s.name.clone()).collect(),
            open_roles: Role::ALL
                .into_iter()
                .filter(|role| team.is_recruited && team.counters.get(*role) > 0)
                .collect(),
        }
    }
}

/// Searchable view of an approved member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDocument {
    pub id: i64,
    pub team_name: String,
    pub role: Role,
    pub summary: Option<String>,
}

impl MemberDocument {
    pub fn new(member: &Member, team_name: &str) -> Self {
        Self {
            id: member.id,
            team_name: team_name.to_string(),
            role: member.role,
            summary: member.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexDocument {
    Team(TeamDocument),
    Member(MemberDocument),
}

impl IndexDocument {
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexDocument::Team(_) => IndexKind::Team,
            IndexDocument::Member(_) => IndexKind::Member,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            IndexDocument::Team(team) => team.id,
            IndexDocument::Member(member) => member.id,
        }
    }
}

/// Write side of the search index as seen by the recruitment service.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn upsert(&self, document: &IndexDocument) -> Result<(), AppError>;
    async fn remove(&self, kind: IndexKind, id: i64) -> Result<(), AppError>;
}

/// Search hit with relevance score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub kind: IndexKind,
    pub id: i64,
    pub title: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    key: Field,
    kind: Field,
    entity_id: Field,
    title: Field,
    body: Field,
    stacks: Field,
}

/// Tantivy search index for teams and members.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let key = schema_builder.add_text_field("key", STRING);
        let kind = schema_builder.add_text_field("kind", STRING | STORED);
        let entity_id = schema_builder.add_i64_field("entity_id", STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let body = schema_builder.add_text_field("body", TEXT);
        let stacks = schema_builder.add_text_field("stacks", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            key,
            kind,
            entity_id,
            title,
            body,
            stacks,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Search documents, optionally restricted to one kind.
    pub fn search(
        &self,
        query_str: &str,
        kind: Option<IndexKind>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() || limit == 0 || offset >= MAX_SEARCH_WINDOW {
            return Ok(Vec::new());
        }
        let window = limit.saturating_add(offset).min(MAX_SEARCH_WINDOW);

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.stacks, BOOST_STACKS),
            (self.fields.body, BOOST_BODY),
        ];

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let text_query: Box<dyn Query> = if subqueries.is_empty() {
            QueryParser::for_index(
                &self.index,
                vec![self.fields.title, self.fields.stacks, self.fields.body],
            )
            .parse_query(query_str)
            .map_err(|e| AppError::Search(format!("Invalid search query: {}", e)))?
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let query: Box<dyn Query> = match kind {
            Some(kind) => {
                let term = Term::from_field_text(self.fields.kind, kind.as_str());
                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, text_query),
                    (
                        Occur::Must,
                        Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
                    ),
                ]))
            }
            None => text_query,
        };

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(window))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let kind = IndexKind::from_str(doc.get_first(self.fields.kind)?.as_str()?)?;
                let id = doc.get_first(self.fields.entity_id)?.as_i64()?;
                let title = doc.get_first(self.fields.title)?.as_str()?.to_string();
                Some(SearchResult {
                    kind,
                    id,
                    title,
                    score,
                })
            })
            .collect();

        Ok(results)
    }

    fn key_term(&self, kind: IndexKind, id: i64) -> Term {
        Term::from_field_text(self.fields.key, &format!("{}:{}", kind.as_str(), id))
    }

    /// Create a Tantivy document.
    fn create_document(&self, document: &IndexDocument) -> TantivyDocument {
        let (title, body, stacks) = match document {
            IndexDocument::Team(team) => {
                let roles: Vec<&str> = team.open_roles.iter().map(|r| r.as_str()).collect();
                (
                    team.name.clone(),
                    format!(
                        "{} {}",
                        team.description.clone().unwrap_or_default(),
                        roles.join(" ")
                    ),
                    team.stacks.join(" "),
                )
            }
            IndexDocument::Member(member) => (
                member.team_name.clone(),
                format!(
                    "{} {}",
                    member.role.as_str(),
                    member.summary.clone().unwrap_or_default()
                ),
                String::new(),
            ),
        };
        let kind = document.kind();

        doc!(
            self.fields.key => format!("{}:{}", kind.as_str(), document.id()),
            self.fields.kind => kind.as_str(),
            self.fields.entity_id => document.id(),
            self.fields.title => title,
            self.fields.body => body,
            self.fields.stacks => stacks
        )
    }
}

#[async_trait]
impl SearchIndexer for SearchIndex {
    async fn upsert(&self, document: &IndexDocument) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(self.key_term(document.kind(), document.id()));
        writer.add_document(self.create_document(document))?;
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    async fn remove(&self, kind: IndexKind, id: i64) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(self.key_term(kind, id));
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }
}
