use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"(?:\+1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s][0-9]{4}\b").unwrap();
    static ref SSN_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
    static ref CREDIT_CARD_REGEX: Regex = Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?(\d{4})\b").unwrap();
    static ref IP_REGEX: Regex = Regex::new(r"\b(\d{1,3})\.\d{1,3}\.\d{1,3}\.(\d{1,3})\b").unwrap();
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_credit_cards: bool,
    pub redact_ip_addresses: bool,
    /// Replace matches with a short digest instead of a mask
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_credit_cards: true,
            redact_ip_addresses: true,
            hash_for_correlation: false,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Configuration that leaves every value untouched.
    pub fn disabled() -> Self {
        Self {
            redact_emails: false,
            redact_phones: false,
            redact_ssn: false,
            redact_credit_cards: false,
            redact_ip_addresses: false,
            hash_for_correlation: false,
            custom_patterns: Vec::new(),
        }
    }

    pub fn with_custom_pattern(mut self, pattern: Regex, replacement: impl Into<String>) -> Self {
        self.custom_patterns.push((pattern, replacement.into()));
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    Ip,
}

impl PiiKind {
    fn tag(self) -> &'static str {
        match self {
            PiiKind::Email => "EMAIL",
            PiiKind::Phone => "PHONE",
            PiiKind::Ssn => "SSN",
            PiiKind::CreditCard => "CC",
            PiiKind::Ip => "IP",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            PiiKind::Email => &*EMAIL_REGEX,
            PiiKind::Phone => &*PHONE_REGEX,
            PiiKind::Ssn => &*SSN_REGEX,
            PiiKind::CreditCard => &*CREDIT_CARD_REGEX,
            PiiKind::Ip => &*IP_REGEX,
        }
    }

    fn mask(self, caps: &Captures<'_>) -> String {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        match self {
            PiiKind::Email => match whole.split_once('@') {
                Some((local, domain)) => {
                    format!("{}***@{}***", first_char(local), first_char(domain))
                }
                None => "***@***".to_string(),
            },
            PiiKind::Phone => "(***) ***-****".to_string(),
            PiiKind::Ssn => "***-**-****".to_string(),
            PiiKind::CreditCard => {
                let last = caps.get(1).map_or("****", |m| m.as_str());
                format!("****-****-****-{}", last)
            }
            PiiKind::Ip => {
                let first = caps.get(1).map_or("***", |m| m.as_str());
                let last = caps.get(2).map_or("***", |m| m.as_str());
                format!("{}.***.***.{}", first, last)
            }
        }
    }
}

fn first_char(value: &str) -> &str {
    value.char_indices().nth(1).map_or(value, |(idx, _)| &value[..idx])
}

/// PII redactor for log messages and audit payloads
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    fn enabled_kinds(&self) -> Vec<PiiKind> {
        // Cards before phones: a card number contains phone-shaped runs.
        [
            (self.config.redact_emails, PiiKind::Email),
            (self.config.redact_ssn, PiiKind::Ssn),
            (self.config.redact_credit_cards, PiiKind::CreditCard),
            (self.config.redact_phones, PiiKind::Phone),
            (self.config.redact_ip_addresses, PiiKind::Ip),
        ]
        .into_iter()
        .filter_map(|(enabled, kind)| enabled.then_some(kind))
        .collect()
    }

    /// Redact every enabled kind of PII found in free text.
    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        for kind in self.enabled_kinds() {
            result = kind
                .regex()
                .replace_all(&result, |caps: &Captures<'_>| self.replace(kind, caps))
                .into_owned();
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).into_owned();
        }

        result
    }

    /// Redact a value known to be a client address.
    ///
    /// IPv6 and other non dotted forms keep only their first group.
    pub fn redact_ip(&self, ip: &str) -> String {
        if !self.config.redact_ip_addresses {
            return ip.to_string();
        }
        if self.config.hash_for_correlation {
            return format!("{}[{}]", PiiKind::Ip.tag(), self.hash_value(ip));
        }
        if let Some(caps) = IP_REGEX.captures(ip) {
            return PiiKind::Ip.mask(&caps);
        }
        match ip.split_once(':') {
            Some((head, _)) if !head.is_empty() => format!("{}:***", head),
            _ => "***".to_string(),
        }
    }

    fn replace(&self, kind: PiiKind, caps: &Captures<'_>) -> String {
        if self.config.hash_for_correlation {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            format!("{}[{}]", kind.tag(), self.hash_value(whole))
        } else {
            kind.mask(caps)
        }
    }

    fn hash_value(&self, value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        // First 8 bytes keep the tag short
        general_purpose::STANDARD.encode(&digest[..8])
    }
}
