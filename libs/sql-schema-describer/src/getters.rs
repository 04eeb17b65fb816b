//! Functions for fetching from result rows

use sql_connection::ResultRow;

pub(crate) trait Getter {
    fn get_expect_string(&self, name: &str) -> String;
    fn get_expect_i64(&self, name: &str) -> i64;
    fn get_expect_bool(&self, name: &str) -> bool;

    fn get_string(&self, name: &str) -> Option<String>;
    fn get_bool(&self, name: &str) -> Option<bool>;
    fn get_u32(&self, name: &str) -> Option<u32>;
    fn get_u64(&self, name: &str) -> Option<u64>;
}

impl Getter for ResultRow {
    #[track_caller]
    fn get_expect_string(&self, name: &str) -> String {
        self.get(name)
            .and_then(|x| x.to_string())
            .ok_or_else(|| format!("Getting {} from ResultRow {:?} as String failed", name, &self))
            .unwrap()
    }

    #[track_caller]
    fn get_expect_i64(&self, name: &str) -> i64 {
        self.get(name)
            .and_then(|x| x.as_i64())
            .ok_or_else(|| format!("Getting {} from ResultRow {:?} as i64 failed", name, &self))
            .unwrap()
    }

    #[track_caller]
    fn get_expect_bool(&self, name: &str) -> bool {
        self.get_bool(name)
            .ok_or_else(|| format!("Getting {} from ResultRow {:?} as bool failed", name, &self))
            .unwrap()
    }

    fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|x| x.to_string())
    }

    // At least on MySQL, the encoding of booleans in the information schema
    // seems to be somewhat flexible, so we match "0", "1", 0 and 1.
    fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|x| {
            x.as_i64()
                .map(|n| n != 0)
                .or_else(|| x.as_str().and_then(|s| match s.trim() {
                    "0" => Some(false),
                    "1" => Some(true),
                    _ => None,
                }))
        })
    }

    fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(|x| x.as_i64().map(|x| x as u32))
    }

    fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(|x| x.as_u64())
    }
}
