//! Audit capability shared by every soft-deletable entity.
//!
//! Creation, update, soft-delete and restore are stamped with the acting
//! user's id, passed explicitly by the caller. The slug is derived once
//! at creation from the display name and is never regenerated on update,
//! so links built on it stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Audit columns carried by every audited table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct AuditFields {
    pub slug: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Capability: an entity whose lifecycle transitions are stamped with
/// actor identity and, at creation, a derived slug.
pub trait Auditable {
    /// Name-like field used for slug derivation, if the entity has one.
    fn display_name(&self) -> Option<&str>;

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;
}

/// Lowercase-and-hyphenate a display name into a slug.
///
/// Runs of non-alphanumeric characters collapse into a single hyphen;
/// leading and trailing hyphens are trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Stamp a new entity: derive the slug from the display name when none
/// was supplied, and record the creating actor.
pub fn stamp_create<E: Auditable>(entity: &mut E, actor: Uuid) {
    let needs_slug = entity.audit().slug.as_deref().map_or(true, str::is_empty);
    if needs_slug {
        if let Some(name) = entity.display_name() {
            let slug = slugify(name);
            if !slug.is_empty() {
                entity.audit_mut().slug = Some(slug);
            }
        }
    }
    entity.audit_mut().created_by = Some(actor);
}

/// Stamp an update. The slug is left untouched even when the display
/// name changed.
pub fn stamp_update<E: Auditable>(entity: &mut E, actor: Uuid) {
    entity.audit_mut().updated_by = Some(actor);
}

/// Stamp a soft delete. The deleter must be persisted together with the
/// delete timestamp.
pub fn stamp_soft_delete<E: Auditable>(entity: &mut E, actor: Uuid) {
    let audit = entity.audit_mut();
    audit.deleted_by = Some(actor);
    audit.deleted_at = Some(Utc::now());
}

/// Clear the delete stamps on restore.
pub fn stamp_restore<E: Auditable>(entity: &mut E) {
    let audit = entity.audit_mut();
    audit.deleted_by = None;
    audit.deleted_at = None;
}
