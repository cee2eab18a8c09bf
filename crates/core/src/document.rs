use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// System-generated document identifier.
pub type DocumentId = Uuid;

/// Declare an enum persisted as a fixed integer code.
///
/// The database row and the search document both carry the numeric code,
/// so serde goes through `code()` / `from_code()` instead of variant names.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $code:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn code(self) -> i16 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: i16) -> Option<Self> {
                match code {
                    $(c if c == $code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i16(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = i16::deserialize(deserializer)?;
                $name::from_code(code).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        concat!("unknown ", stringify!($name), " code {}"),
                        code
                    ))
                })
            }
        }
    };
}

coded_enum! {
    /// File classification derived from the upstream type tag.
    pub enum FileType {
        Unclassified = 0,
        Image = 1,
        Video = 2,
        Pdf = 3,
        Doc = 4,
    }
}

coded_enum! {
    /// Overall document lifecycle.
    pub enum DocumentStatus {
        NotStarted = 1,
        Pending = 2,
        Done = 3,
        Failed = 4,
    }
}

coded_enum! {
    /// Per-stage marker tracked by downstream processors.
    pub enum ProcessStatus {
        Error = -1,
        Pending = 0,
        Processing = 1,
        Done = 2,
    }
}

coded_enum! {
    pub enum ApproveStatus {
        Draft = 0,
        Pending = 1,
        Approved = 2,
        Rejected = 3,
    }
}

coded_enum! {
    pub enum BackupStatus {
        NotBackedUp = 0,
        BackedUp = 1,
    }
}

coded_enum! {
    pub enum Privacy {
        Public = 0,
        Conditional = 1,
        Private = 2,
    }
}

coded_enum! {
    pub enum PhysicalState {
        Good = 1,
        Normal = 2,
        Damaged = 3,
    }
}

coded_enum! {
    pub enum ReliabilityLevel {
        ElectronicOriginal = 1,
        Digitized = 2,
        Mixed = 3,
    }
}

/// Canonical document record, written once to the primary store and
/// mirrored into the search index under the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Upstream identifier; unique across the primary store.
    pub integration_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autograph: Option<String>,
    pub file_type: FileType,
    pub created_time: DateTime<Utc>,
    pub inserted_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_time: Option<DateTime<Utc>>,
    pub original_lang_code: String,
    pub translate_lang_code: String,
    pub privacy: Privacy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_state: Option<PhysicalState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reliability_level: Option<ReliabilityLevel>,
    pub keywords: Vec<String>,
    /// JSON copy of the event this document was built from.
    pub metadata: String,
    pub creator_id: String,
    pub creator_name: String,
    pub input_source_type: String,

    pub status: DocumentStatus,
    pub approve_status: ApproveStatus,
    pub backup_status: BackupStatus,
    pub has_backup: bool,
    pub details_updated: bool,
    pub ocr_process_status: ProcessStatus,
    pub face_detect_process_status: ProcessStatus,
    pub extract_pure_info_process_status: ProcessStatus,
    pub extract_content_process_status: ProcessStatus,
    pub legal_document_process_status: ProcessStatus,

    pub priority: i32,
    pub is_detect_face: bool,
    pub can_find_document_by_image: bool,
    pub input_file_urls: Vec<String>,
    pub configs: Vec<serde_json::Value>,
}
