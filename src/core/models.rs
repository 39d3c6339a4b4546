use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;

/// A single field value on a list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Wall-clock time in the configured local zone.
    Date(NaiveDateTime),
    Lookup { id: i64, display: String },
}

impl FieldValue {
    /// The value as plain text, the way it would be compared or parsed.
    #[must_use]
    pub fn raw(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Date(dt) => Cow::Owned(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            FieldValue::Lookup { display, .. } => Cow::Borrowed(display),
        }
    }
}

/// A list item as handed over by the item source. Null fields are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub id: i64,
    pub fields: BTreeMap<String, FieldValue>,
}

impl ListItem {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.fields
            .insert(name.to_string(), FieldValue::Text(value.to_string()));
        self
    }

    #[must_use]
    pub fn with_date(mut self, name: &str, value: NaiveDateTime) -> Self {
        self.fields.insert(name.to_string(), FieldValue::Date(value));
        self
    }

    #[must_use]
    pub fn with_lookup(mut self, name: &str, id: i64, display: &str) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldValue::Lookup {
                id,
                display: display.to_string(),
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Raw text of a field; missing fields read as the empty string.
    #[must_use]
    pub fn raw(&self, name: &str) -> Cow<'_, str> {
        self.get(name).map_or(Cow::Borrowed(""), FieldValue::raw)
    }

    /// Id of the record a lookup field points at.
    #[must_use]
    pub fn lookup_id(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Lookup { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Urgency class of an item for its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    WayOverdue,
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
}

impl Bucket {
    /// Render order inside a digest.
    pub const ALL: [Bucket; 5] = [
        Bucket::WayOverdue,
        Bucket::Overdue,
        Bucket::Today,
        Bucket::Tomorrow,
        Bucket::ThisWeek,
    ];

    /// Name of the conditional template block shown when the bucket has items.
    #[must_use]
    pub fn block_name(self) -> &'static str {
        match self {
            Bucket::WayOverdue => "HAS_WAY_OVERDUE_TASK",
            Bucket::Overdue => "HAS_OVERDUE_TASK",
            Bucket::Today => "HAS_TODAY_TASKS",
            Bucket::Tomorrow => "HAS_TOMORROW_TASKS",
            Bucket::ThisWeek => "HAS_THISWEEK_TASKS",
        }
    }

    /// Name of the token that receives the bucket's rendered item list.
    #[must_use]
    pub fn list_token(self) -> &'static str {
        match self {
            Bucket::WayOverdue => "WAY_OVERDUE_TASKS",
            Bucket::Overdue => "OVERDUE_TASKS",
            Bucket::Today => "TODAY_TASKS",
            Bucket::Tomorrow => "TOMORROW_TASKS",
            Bucket::ThisWeek => "THISWEEK_TASKS",
        }
    }
}

/// The five ordered item lists of one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientBuckets {
    pub email: String,
    pub way_overdue: Vec<ListItem>,
    pub overdue: Vec<ListItem>,
    pub today: Vec<ListItem>,
    pub tomorrow: Vec<ListItem>,
    pub this_week: Vec<ListItem>,
}

impl RecipientBuckets {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            way_overdue: Vec::new(),
            overdue: Vec::new(),
            today: Vec::new(),
            tomorrow: Vec::new(),
            this_week: Vec::new(),
        }
    }

    #[must_use]
    pub fn items(&self, bucket: Bucket) -> &[ListItem] {
        match bucket {
            Bucket::WayOverdue => &self.way_overdue,
            Bucket::Overdue => &self.overdue,
            Bucket::Today => &self.today,
            Bucket::Tomorrow => &self.tomorrow,
            Bucket::ThisWeek => &self.this_week,
        }
    }

    pub fn push(&mut self, bucket: Bucket, item: ListItem) {
        match bucket {
            Bucket::WayOverdue => self.way_overdue.push(item),
            Bucket::Overdue => self.overdue.push(item),
            Bucket::Today => self.today.push(item),
            Bucket::Tomorrow => self.tomorrow.push(item),
            Bucket::ThisWeek => self.this_week.push(item),
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.items(*b).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Classified items for every recipient, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientDigest {
    recipients: Vec<RecipientBuckets>,
}

impl RecipientDigest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket set for `email`, created empty on first use.
    pub fn entry(&mut self, email: &str) -> &mut RecipientBuckets {
        let idx = match self.recipients.iter().position(|r| r.email == email) {
            Some(idx) => idx,
            None => {
                self.recipients.push(RecipientBuckets::new(email));
                self.recipients.len() - 1
            }
        };
        &mut self.recipients[idx]
    }

    #[must_use]
    pub fn get(&self, email: &str) -> Option<&RecipientBuckets> {
        self.recipients.iter().find(|r| r.email == email)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipientBuckets> {
        self.recipients.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub html_body: String,
}
