pub mod paths;

use std::cmp::Ordering;
use std::fmt::Debug;
use unicase::UniCase;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization as _};

pub trait ResultExt<E> {
    type Ok;

    fn log_err(self) -> Option<Self::Ok>;
    fn warn_on_err(self) -> Option<Self::Ok>;
}

impl<T, E> ResultExt<E> for Result<T, E>
where
    E: Debug,
{
    type Ok = T;

    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                log::error!("{}:{}: {:?}", caller.file(), caller.line(), error);
                None
            }
        }
    }

    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                log::warn!("{:?}", error);
                None
            }
        }
    }
}

/// Orders strings the way a user reading a sorted list expects: letters are
/// compared without regard to accents or case first, and only strings that
/// are equal ignoring both fall back to a character-by-character comparison
/// that places lowercase spellings first.
pub fn compare_locale_aware(a: &str, b: &str) -> Ordering {
    let a_key = collation_key(a);
    let b_key = collation_key(b);
    UniCase::new(a_key.as_str())
        .cmp(&UniCase::new(b_key.as_str()))
        .then_with(|| {
            for (a_char, b_char) in a.chars().zip(b.chars()) {
                if a_char == b_char {
                    continue;
                }
                return match (a_char.is_lowercase(), b_char.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => a_char.cmp(&b_char),
                };
            }
            a.len().cmp(&b.len())
        })
}

/// `text` with diacritics removed, so `é` sorts with `e`.
fn collation_key(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
