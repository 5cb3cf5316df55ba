use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

use crate::format::{DATE_FORMAT, Tone};

/// A record collection exposed by the backend under `PATH`.
pub trait Resource: serde::de::DeserializeOwned + Send + 'static {
    const PATH: &'static str;
    const NAME: &'static str;

    fn id(&self) -> &str;
}

pub trait Searchable {
    fn haystack(&self) -> Vec<&str>;

    /// Case-insensitive substring match over `haystack`. Blank queries match.
    fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.haystack()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

pub trait Status: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;
    fn tone(&self) -> Tone;

    fn key(&self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.key() == key)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status for AppointmentStatus {
    const ALL: &'static [Self] = &[
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Unknown => "Unknown",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            AppointmentStatus::Pending => Tone::Warning,
            AppointmentStatus::Confirmed => Tone::Info,
            AppointmentStatus::Completed => Tone::Success,
            AppointmentStatus::Cancelled => Tone::Danger,
            AppointmentStatus::Unknown => Tone::Neutral,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status for RequestStatus {
    const ALL: &'static [Self] = &[
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Completed,
    ];

    fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Completed => "Completed",
            RequestStatus::Unknown => "Unknown",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            RequestStatus::Pending => Tone::Warning,
            RequestStatus::Approved => Tone::Success,
            RequestStatus::Rejected => Tone::Danger,
            RequestStatus::Completed => Tone::Info,
            RequestStatus::Unknown => Tone::Neutral,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
            RequestStatus::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Pending,
    Approved,
    Rejected,
    Released,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status for CertificateStatus {
    const ALL: &'static [Self] = &[
        CertificateStatus::Pending,
        CertificateStatus::Approved,
        CertificateStatus::Rejected,
        CertificateStatus::Released,
    ];

    fn label(&self) -> &'static str {
        match self {
            CertificateStatus::Pending => "Pending",
            CertificateStatus::Approved => "Approved",
            CertificateStatus::Rejected => "Rejected",
            CertificateStatus::Released => "Released",
            CertificateStatus::Unknown => "Unknown",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            CertificateStatus::Pending => Tone::Warning,
            CertificateStatus::Approved => Tone::Success,
            CertificateStatus::Rejected => Tone::Danger,
            CertificateStatus::Released => Tone::Info,
            CertificateStatus::Unknown => Tone::Neutral,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            CertificateStatus::Pending => "pending",
            CertificateStatus::Approved => "approved",
            CertificateStatus::Rejected => "rejected",
            CertificateStatus::Released => "released",
            CertificateStatus::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Status for PaymentStatus {
    const ALL: &'static [Self] = &[
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Unknown => "Unknown",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            PaymentStatus::Pending => Tone::Warning,
            PaymentStatus::Paid => Tone::Success,
            PaymentStatus::Failed => Tone::Danger,
            PaymentStatus::Refunded => Tone::Neutral,
            PaymentStatus::Unknown => Tone::Neutral,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    Baptism,
    Marriage,
    Confirmation,
    #[serde(other)]
    Other,
}

impl CertificateType {
    pub fn label(&self) -> &'static str {
        match self {
            CertificateType::Baptism => "Baptism",
            CertificateType::Marriage => "Marriage",
            CertificateType::Confirmation => "Confirmation",
            CertificateType::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Member {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_date")]
    pub joined_on: Option<Date>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Priest {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_date")]
    pub ordained_on: Option<Date>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Baptism {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub child_name: String,
    #[serde(deserialize_with = "date")]
    pub baptism_date: Date,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub godparents: Vec<String>,
    #[serde(default)]
    pub priest_name: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Marriage {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub groom_name: String,
    pub bride_name: String,
    #[serde(deserialize_with = "date")]
    pub marriage_date: Date,
    #[serde(default)]
    pub witnesses: Vec<String>,
    #[serde(default)]
    pub priest_name: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Confirmation {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub candidate_name: String,
    #[serde(deserialize_with = "date")]
    pub confirmation_date: Date,
    #[serde(default)]
    pub sponsor_name: Option<String>,
    #[serde(default)]
    pub priest_name: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Appointment {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub title: String,
    pub requested_by: String,
    #[serde(deserialize_with = "date")]
    pub appointment_date: Date,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub priest_name: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceRequest {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub service_type: String,
    pub requested_by: String,
    #[serde(default, deserialize_with = "opt_date")]
    pub preferred_date: Option<Date>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: RequestStatus,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CertificateRequest {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub certificate_type: CertificateType,
    pub requested_by: String,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(deserialize_with = "date")]
    pub requested_on: Date,
    #[serde(default)]
    pub status: CertificateStatus,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "id")]
    pub id: String,
    pub payer_name: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "opt_date")]
    pub paid_on: Option<Date>,
    #[serde(default)]
    pub status: PaymentStatus,
}

/// Create payload for the member form.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl NewMember {
    /// Blank optional fields from an HTML form become `None`.
    pub fn normalized(self) -> Result<Self, String> {
        fn blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        }
        let first_name = self.first_name.trim().to_owned();
        let last_name = self.last_name.trim().to_owned();
        if first_name.is_empty() || last_name.is_empty() {
            return Err("First and last name are required".to_owned());
        }
        Ok(Self {
            first_name,
            last_name,
            email: blank(self.email),
            phone: blank(self.phone),
            address: blank(self.address),
        })
    }
}

fn opt_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

impl Resource for Member {
    const PATH: &'static str = "members";
    const NAME: &'static str = "member";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Member {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            opt_str(&self.email),
            opt_str(&self.phone),
            opt_str(&self.address),
        ]
    }
}

impl Resource for Priest {
    const PATH: &'static str = "priests";
    const NAME: &'static str = "priest";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Priest {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            opt_str(&self.position),
            opt_str(&self.email),
            opt_str(&self.phone),
        ]
    }
}

impl Resource for Baptism {
    const PATH: &'static str = "baptisms";
    const NAME: &'static str = "baptism";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Baptism {
    fn haystack(&self) -> Vec<&str> {
        let mut fields = vec![
            self.child_name.as_str(),
            opt_str(&self.father_name),
            opt_str(&self.mother_name),
            opt_str(&self.priest_name),
            opt_str(&self.place),
        ];
        fields.extend(self.godparents.iter().map(String::as_str));
        fields
    }
}

impl Resource for Marriage {
    const PATH: &'static str = "marriages";
    const NAME: &'static str = "marriage";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Marriage {
    fn haystack(&self) -> Vec<&str> {
        let mut fields = vec![
            self.groom_name.as_str(),
            self.bride_name.as_str(),
            opt_str(&self.priest_name),
            opt_str(&self.place),
        ];
        fields.extend(self.witnesses.iter().map(String::as_str));
        fields
    }
}

impl Resource for Confirmation {
    const PATH: &'static str = "confirmations";
    const NAME: &'static str = "confirmation";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Confirmation {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.candidate_name.as_str(),
            opt_str(&self.sponsor_name),
            opt_str(&self.priest_name),
            opt_str(&self.place),
        ]
    }
}

impl Resource for Appointment {
    const PATH: &'static str = "appointments";
    const NAME: &'static str = "appointment";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Appointment {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.requested_by.as_str(),
            opt_str(&self.priest_name),
        ]
    }
}

impl Resource for ServiceRequest {
    const PATH: &'static str = "service-requests";
    const NAME: &'static str = "service request";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for ServiceRequest {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.service_type.as_str(),
            self.requested_by.as_str(),
            opt_str(&self.notes),
        ]
    }
}

impl Resource for CertificateRequest {
    const PATH: &'static str = "certificates";
    const NAME: &'static str = "certificate request";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for CertificateRequest {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.certificate_type.label(),
            self.requested_by.as_str(),
            opt_str(&self.purpose),
        ]
    }
}

impl Resource for Payment {
    const PATH: &'static str = "payments";
    const NAME: &'static str = "payment";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Searchable for Payment {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.payer_name.as_str(),
            self.description.as_str(),
            opt_str(&self.method),
            opt_str(&self.reference),
        ]
    }
}

fn default_true() -> bool {
    true
}

fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

pub fn parse_date(value: &str) -> Result<Date, String> {
    let value = value.trim();
    if let Ok(date) = Date::parse(value, &DATE_FORMAT) {
        return Ok(date);
    }
    OffsetDateTime::parse(value, &Rfc3339)
        .map(|d| d.date())
        .map_err(|err| format!("Invalid date {value:?}: {err}"))
}

fn date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_date(&value).map_err(serde::de::Error::custom)
}

fn opt_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Applies an optional status filter given as a query value.
pub fn status_filter<S: Status>(value: Option<&str>) -> Option<S> {
    value.filter(|v| !v.is_empty()).and_then(S::from_key)
}

pub fn display_names<T: Display>(values: &[T]) -> String {
    itertools::Itertools::join(&mut values.iter(), ", ")
}
