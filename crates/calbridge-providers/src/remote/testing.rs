//! In-memory backend used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::crypto::testing::{encrypt_armored, encrypt_split, locked_key, sign};
use crate::error::ClientError;
use crate::provider::BoxFuture;

use super::client::{ClientResult, RemoteCalendarClient};
use super::types::{
    Address, AddressKey, Calendar, CalendarKey, CalendarMember, CalendarPassphrase, CalendarType,
    EventPart, MemberPassphrase, RawEventRecord,
};

pub const ACCOUNT_PASSPHRASE: &str = "hunter2";
pub const CALENDAR_SECRET: &str = "calendar-secret";
pub const CALENDAR_ID: &str = "cal-1";

#[derive(Default)]
pub struct FakeRemote {
    pub addresses: Vec<Address>,
    pub calendars: Vec<Calendar>,
    pub members: HashMap<String, Vec<CalendarMember>>,
    pub passphrases: HashMap<String, CalendarPassphrase>,
    pub keys: HashMap<String, Vec<CalendarKey>>,
    pub events: HashMap<String, Vec<RawEventRecord>>,
    /// Method names that fail with a client error.
    pub failing: HashSet<&'static str>,
    /// When set, address requests never complete.
    pub hang_addresses: bool,
    /// When set, event page requests never complete.
    pub hang_events: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    /// One address with one key, one personal calendar with one member and
    /// one key, no events.
    pub fn account() -> Self {
        let mut remote = Self {
            addresses: vec![Address {
                id: "addr-1".into(),
                email: "user@example.com".into(),
                keys: vec![AddressKey::new("ak-1", locked_key("addr", ACCOUNT_PASSPHRASE))],
            }],
            calendars: vec![Calendar {
                id: CALENDAR_ID.into(),
                name: "Personal".into(),
                kind: CalendarType::NORMAL,
            }],
            ..Self::default()
        };
        remote.members.insert(
            CALENDAR_ID.into(),
            vec![CalendarMember {
                id: "member-1".into(),
                email: "user@example.com".into(),
                permissions: 0,
            }],
        );
        remote.passphrases.insert(
            CALENDAR_ID.into(),
            CalendarPassphrase {
                id: "pp-1".into(),
                member_passphrases: vec![MemberPassphrase {
                    member_id: "member-1".into(),
                    passphrase: encrypt_armored("addr", CALENDAR_SECRET),
                    signature: sign("addr", CALENDAR_SECRET),
                }],
            },
        );
        remote.keys.insert(
            CALENDAR_ID.into(),
            vec![CalendarKey {
                id: "ck-1".into(),
                private_key: locked_key("cal", CALENDAR_SECRET),
                flags: 3,
            }],
        );
        remote
    }

    pub fn with_events(mut self, calendar_id: &str, events: Vec<RawEventRecord>) -> Self {
        self.events.insert(calendar_id.into(), events);
        self
    }

    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    /// Number of calls made to `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(method))
            .count()
    }

    /// Arguments of every call to `method`, in order.
    pub fn call_args(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| call.strip_prefix(method)?.strip_prefix(':'))
            .map(str::to_string)
            .collect()
    }

    fn record(&self, method: &'static str, args: String) -> ClientResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{method}:{args}"));
        if self.failing.contains(method) {
            return Err(ClientError::new(format!("{method} unavailable")));
        }
        Ok(())
    }

    fn lookup<T: Clone>(map: &HashMap<String, T>, id: &str) -> ClientResult<T> {
        map.get(id)
            .cloned()
            .ok_or_else(|| ClientError::new(format!("calendar {id} not found")))
    }
}

/// A record with one signed split-form shared part and one encrypted personal part.
pub fn event_record(id: &str, calendar_id: &str, shared: &str, personal: &str) -> RawEventRecord {
    let (key_packet, data_packet) = encrypt_split("cal", shared);
    let mut record = RawEventRecord::new(id, calendar_id);
    record.shared_key_packet = Some(key_packet);
    record.shared_events = vec![EventPart::encrypted(data_packet).with_signature(sign("addr", shared))];
    if !personal.is_empty() {
        record.personal_events = vec![EventPart::encrypted(encrypt_armored("cal", personal))];
    }
    record
}

impl RemoteCalendarClient for FakeRemote {
    fn get_addresses(&self) -> BoxFuture<'_, ClientResult<Vec<Address>>> {
        Box::pin(async move {
            self.record("get_addresses", String::new())?;
            if self.hang_addresses {
                std::future::pending::<()>().await;
            }
            Ok(self.addresses.clone())
        })
    }

    fn get_calendars(&self) -> BoxFuture<'_, ClientResult<Vec<Calendar>>> {
        Box::pin(async move {
            self.record("get_calendars", String::new())?;
            Ok(self.calendars.clone())
        })
    }

    fn get_calendar_members<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<Vec<CalendarMember>>> {
        Box::pin(async move {
            self.record("get_calendar_members", calendar_id.to_string())?;
            Ok(self.members.get(calendar_id).cloned().unwrap_or_default())
        })
    }

    fn get_calendar_passphrase<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<CalendarPassphrase>> {
        Box::pin(async move {
            self.record("get_calendar_passphrase", calendar_id.to_string())?;
            Self::lookup(&self.passphrases, calendar_id)
        })
    }

    fn get_calendar_keys<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<Vec<CalendarKey>>> {
        Box::pin(async move {
            self.record("get_calendar_keys", calendar_id.to_string())?;
            Self::lookup(&self.keys, calendar_id)
        })
    }

    fn get_calendar_events<'a>(
        &'a self,
        calendar_id: &'a str,
        page: usize,
        page_size: usize,
    ) -> BoxFuture<'a, ClientResult<Vec<RawEventRecord>>> {
        Box::pin(async move {
            self.record(
                "get_calendar_events",
                format!("{calendar_id}:{page}:{page_size}"),
            )?;
            if self.hang_events {
                std::future::pending::<()>().await;
            }
            let all = self.events.get(calendar_id).map(Vec::as_slice).unwrap_or(&[]);
            let start = (page * page_size).min(all.len());
            let end = (start + page_size).min(all.len());
            Ok(all[start..end].to_vec())
        })
    }
}
