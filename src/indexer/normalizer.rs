//! Conversion of raw content records into indexed documents

use crate::indexer::error::{IndexerError, IndexerResult};
use crate::models::{ContentType, Language, RawRecord};
use crate::search::text::{extract_keywords, normalize_text};
use crate::search::{Author, DocumentMetadata, IndexedDocument, SearchConfig};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

const ID_FIELDS: &[&str] = &["id", "uid", "_id"];
const DESCRIPTION_FIELDS: &[&str] = &["description", "summary", "excerpt", "shortDescription"];
const CONTENT_FIELDS: &[&str] = &[
    "content",
    "body",
    "text",
    "details",
    "bio",
    "about",
    "cvHighlights",
];
const TAG_FIELDS: &[&str] = &["tags", "skills", "categories", "topics", "expertise", "expertiseAreas"];
const CREATED_FIELDS: &[&str] = &[
    "createdAt",
    "created_at",
    "publishedAt",
    "registeredAt",
    "postedAt",
    "date",
];
const UPDATED_FIELDS: &[&str] = &["updatedAt", "updated_at", "modifiedAt"];
const CATEGORY_FIELDS: &[&str] = &["category", "categoryName", "eventType", "jobType", "industry"];
const LOCATION_FIELDS: &[&str] = &["location", "city", "venue", "campus"];
const COMPANY_FIELDS: &[&str] = &["company", "companyName", "currentCompany", "organization"];
const LEVEL_FIELDS: &[&str] = &["level", "experienceLevel", "seniority", "academicLevel"];
const STATUS_FIELDS: &[&str] = &["status", "lifecycleStatus"];
const POPULARITY_FIELDS: &[&str] = &[
    "popularity",
    "views",
    "viewCount",
    "likes",
    "attendees",
    "attendeeCount",
    "applicants",
    "applicationCount",
    "replies",
    "replyCount",
];

/// Title aliases per content type; members and mentors are handled by name synthesis
fn title_fields(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Jobs => &["title", "position", "jobTitle"],
        ContentType::Events => &["title", "name", "eventName"],
        ContentType::Forums => &["title", "subject", "topic"],
        ContentType::Resources => &["title", "name"],
        ContentType::News => &["title", "headline"],
        ContentType::Members | ContentType::Mentors => &["displayName", "name", "fullName"],
    }
}

/// Maps raw records of every content type into [`IndexedDocument`]s.
///
/// Pure: the same record always yields the same document.
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    keywords_per_document: usize,
    type_boosts: HashMap<ContentType, f32>,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl ContentNormalizer {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            keywords_per_document: config.keywords_per_document,
            type_boosts: config.type_boosts.clone(),
        }
    }

    /// Normalize one record of the declared type.
    ///
    /// Fails with [`IndexerError::MalformedContent`] naming the first missing
    /// required field (`id`, then `title`).
    pub fn normalize(
        &self,
        record: &RawRecord,
        content_type: ContentType,
    ) -> IndexerResult<IndexedDocument> {
        let id = record
            .str_field(ID_FIELDS)
            .ok_or_else(|| IndexerError::malformed(content_type, "id"))?;
        let title =
            Self::title(record, content_type).ok_or_else(|| IndexerError::malformed(content_type, "title"))?;

        let description = record
            .str_field(DESCRIPTION_FIELDS)
            .or_else(|| Self::profile_summary(record, content_type))
            .unwrap_or_default();
        let content = record.str_field(CONTENT_FIELDS).unwrap_or_default();
        let tags = dedup_tags(record.string_list(TAG_FIELDS));

        let searchable_text = normalize_text(&format!(
            "{} {} {} {}",
            title,
            description,
            content,
            tags.join(" ")
        ));
        let keywords = extract_keywords(&searchable_text, self.keywords_per_document);

        let url = record
            .str_field(&["url", "link"])
            .unwrap_or_else(|| format!("/{}/{}", content_type.url_segment(), id));

        let language = record
            .str_field(&["language", "lang"])
            .and_then(|code| Language::from_str(&code).ok())
            .unwrap_or_default();

        let record_boost = record.f64_field(&["boost"]).unwrap_or(1.0) as f32;
        let type_boost = self.type_boosts.get(&content_type).copied().unwrap_or(1.0);

        let created_at = record
            .timestamp(CREATED_FIELDS)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let updated_at = record.timestamp(UPDATED_FIELDS).unwrap_or(created_at);

        let is_active = record
            .bool_field(&["isActive", "is_active", "active"])
            .unwrap_or(true);

        Ok(IndexedDocument {
            id,
            content_type,
            title,
            content,
            description,
            url,
            tags,
            keywords,
            searchable_text,
            language,
            boost: record_boost * type_boost,
            created_at,
            updated_at,
            is_active,
            author: Self::author(record),
            metadata: DocumentMetadata {
                category: record.str_field(CATEGORY_FIELDS),
                location: record.str_field(LOCATION_FIELDS),
                company: record.str_field(COMPANY_FIELDS),
                level: record.str_field(LEVEL_FIELDS),
                status: record.str_field(STATUS_FIELDS),
                popularity: record.count_field(POPULARITY_FIELDS).unwrap_or(0),
            },
        })
    }

    fn title(record: &RawRecord, content_type: ContentType) -> Option<String> {
        record.str_field(title_fields(content_type)).or_else(|| {
            matches!(content_type, ContentType::Members | ContentType::Mentors)
                .then(|| full_name(record))
                .flatten()
        })
    }

    /// "Position at Company" for people without a written description
    fn profile_summary(record: &RawRecord, content_type: ContentType) -> Option<String> {
        if !matches!(content_type, ContentType::Members | ContentType::Mentors) {
            return None;
        }
        let position = record.str_field(&["position", "currentPosition", "headline", "jobTitle"]);
        let company = record.str_field(COMPANY_FIELDS);
        match (position, company) {
            (Some(position), Some(company)) => Some(format!("{} at {}", position, company)),
            (Some(position), None) => Some(position),
            (None, Some(company)) => Some(company),
            (None, None) => None,
        }
    }

    /// Nested `author` object, or flat `authorId`/`authorName` fields
    fn author(record: &RawRecord) -> Option<Author> {
        if let Some(author) = record.object("author") {
            let name = author.str_field(&["name", "displayName"])?;
            return Some(Author {
                id: author.str_field(&["id", "uid"]).unwrap_or_else(|| name.clone()),
                name,
                avatar: author.str_field(&["avatar", "photoURL", "photoUrl"]),
            });
        }

        let name = record.str_field(&["authorName", "postedByName", "createdByName"])?;
        Some(Author {
            id: record
                .str_field(&["authorId", "postedBy", "createdBy"])
                .unwrap_or_else(|| name.clone()),
            name,
            avatar: record.str_field(&["authorAvatar"]),
        })
    }
}

fn full_name(record: &RawRecord) -> Option<String> {
    let parts: Vec<String> = [
        record.str_field(&["firstName"]),
        record.str_field(&["lastName"]),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Case-insensitive dedup keeping the first spelling
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchConfigBuilder;
    use chrono::TimeZone;
    use serde_json::json;

    fn normalizer() -> ContentNormalizer {
        ContentNormalizer::default()
    }

    #[test]
    fn test_job_normalization() {
        let record = RawRecord::new()
            .with("id", "job-1")
            .with("title", "Senior Data Scientist")
            .with("description", "Lead the analytics team.")
            .with("requirements", "ignored")
            .with("companyName", "TechCorp")
            .with("location", "CDMX")
            .with("tags", json!(["Python", "python", "SQL"]))
            .with("applicants", json!(["u1", "u2"]))
            .with("createdAt", "2024-02-01T10:00:00Z");

        let doc = normalizer().normalize(&record, ContentType::Jobs).unwrap();

        assert_eq!(doc.id, "job-1");
        assert_eq!(doc.title, "Senior Data Scientist");
        assert_eq!(doc.url, "/jobs/job-1");
        assert_eq!(doc.tags, vec!["Python", "SQL"]);
        assert_eq!(doc.metadata.company.as_deref(), Some("TechCorp"));
        assert_eq!(doc.metadata.popularity, 2);
        assert_eq!(doc.created_at, Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap());
        assert_eq!(doc.updated_at, doc.created_at);
        assert!(doc.is_active);
        assert_eq!(
            doc.searchable_text,
            "senior data scientist lead the analytics team python sql"
        );
        assert!(doc.keywords.contains(&"senior".to_string()));
        assert!(doc.keywords.iter().all(|k| k.chars().count() > 3));
    }

    #[test]
    fn test_member_title_synthesis() {
        let record = RawRecord::new()
            .with("uid", "m-7")
            .with("firstName", "Ana")
            .with("lastName", "Ruiz López")
            .with("position", "ML Engineer")
            .with("company", "AI Solutions")
            .with("skills", "Python; Spark")
            .with("experienceLevel", "senior");

        let doc = normalizer().normalize(&record, ContentType::Members).unwrap();

        assert_eq!(doc.title, "Ana Ruiz López");
        assert_eq!(doc.description, "ML Engineer at AI Solutions");
        assert_eq!(doc.tags, vec!["Python", "Spark"]);
        assert_eq!(doc.url, "/directory/m-7");
        assert_eq!(doc.metadata.level.as_deref(), Some("senior"));
    }

    #[test]
    fn test_missing_required_fields() {
        let no_id = RawRecord::new().with("title", "Orphan");
        assert_eq!(
            normalizer().normalize(&no_id, ContentType::Events),
            Err(IndexerError::malformed(ContentType::Events, "id"))
        );

        let no_title = RawRecord::new().with("id", "f1").with("body", "text");
        assert_eq!(
            normalizer().normalize(&no_title, ContentType::Forums),
            Err(IndexerError::malformed(ContentType::Forums, "title"))
        );
    }

    #[test]
    fn test_author_and_boosts() {
        let config = SearchConfigBuilder::new()
            .type_boost(ContentType::Events, 2.0)
            .build();
        let record = RawRecord::new()
            .with("id", "ev-1")
            .with("name", "Meetup de Datos")
            .with("boost", 1.5)
            .with("isActive", false)
            .with("language", "EN")
            .with("author", json!({ "id": "u9", "name": "Luis" }));

        let doc = ContentNormalizer::new(&config)
            .normalize(&record, ContentType::Events)
            .unwrap();

        assert_eq!(doc.title, "Meetup de Datos");
        assert_eq!(doc.boost, 3.0);
        assert!(!doc.is_active);
        assert_eq!(doc.language, Language::En);
        assert_eq!(doc.author.unwrap().name, "Luis");
        assert_eq!(doc.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let record = RawRecord::new()
            .with("id", "r1")
            .with("title", "Guía de análisis")
            .with("content", "análisis exploratorio y análisis causal");
        let a = normalizer().normalize(&record, ContentType::Resources).unwrap();
        let b = normalizer().normalize(&record, ContentType::Resources).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.keywords[0], "análisis");
    }
}
