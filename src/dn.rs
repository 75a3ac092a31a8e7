//! Distinguished Name (DN) parsing and walking (RFC 4514), generalized
//! to multi-valued RDNs (`cn=Alice+ou=Engineering`) so the extensible
//! match's `dnAttrs` augmentation can walk every AVA of every RDN.

use std::fmt;

use crate::errors::{LdapError, LdapResult};

/// One attribute-value assertion inside an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ava {
    pub attr_type: String,
    pub attr_value: String,
}

impl Ava {
    pub fn new(attr_type: impl Into<String>, attr_value: impl Into<String>) -> Self {
        Self {
            attr_type: attr_type.into(),
            attr_value: attr_value.into(),
        }
    }

    fn parse(s: &str) -> LdapResult<Self> {
        let (ty, val) = s
            .split_once('=')
            .ok_or_else(|| LdapError::InvalidSyntax(format!("malformed AVA: {s}")))?;
        Ok(Self {
            attr_type: ty.trim().to_string(),
            attr_value: unescape_dn_value(val.trim()),
        })
    }
}

impl fmt::Display for Ava {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attr_type, escape_dn_value(&self.attr_value))
    }
}

/// A single RDN: one or more AVAs joined with `+`. Order of the AVAs is
/// preserved but, per RFC 4514, has no semantic significance — two RDNs
/// with the same AVA set in a different order are the same RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    pub avas: Vec<Ava>,
}

impl Rdn {
    fn parse(s: &str) -> LdapResult<Self> {
        let parts = split_unescaped(s, '+');
        let avas: LdapResult<Vec<Ava>> = parts.iter().map(|p| Ava::parse(p)).collect();
        Ok(Self { avas: avas? })
    }

    /// The first AVA's type/value — the common single-valued-RDN case.
    pub fn first(&self) -> Option<&Ava> {
        self.avas.first()
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.avas.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", parts.join("+"))
    }
}

/// A full Distinguished Name: RDNs ordered most-specific to least-specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    pub rdns: Vec<Rdn>,
}

impl DistinguishedName {
    pub fn empty() -> Self {
        Self { rdns: vec![] }
    }

    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        Self { rdns }
    }

    pub fn parse(dn: &str) -> LdapResult<Self> {
        if dn.is_empty() {
            return Ok(Self::empty());
        }
        let parts = split_unescaped(dn, ',');
        let rdns: LdapResult<Vec<Rdn>> = parts.iter().map(|p| Rdn::parse(p)).collect();
        Ok(Self { rdns: rdns? })
    }

    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.rdns.len() <= 1 {
            None
        } else {
            Some(Self {
                rdns: self.rdns[1..].to_vec(),
            })
        }
    }

    pub fn rdn_value(&self) -> Option<&str> {
        self.rdn().and_then(|r| r.first()).map(|a| a.attr_value.as_str())
    }

    pub fn rdn_type(&self) -> Option<&str> {
        self.rdn().and_then(|r| r.first()).map(|a| a.attr_type.as_str())
    }

    pub fn is_under(&self, base: &DistinguishedName) -> bool {
        if base.rdns.len() > self.rdns.len() {
            return false;
        }
        let offset = self.rdns.len() - base.rdns.len();
        self.rdns[offset..]
            .iter()
            .zip(base.rdns.iter())
            .all(|(a, b)| rdn_eq_canonical(a, b))
    }

    pub fn append(&self, base: &DistinguishedName) -> Self {
        let mut rdns = self.rdns.clone();
        rdns.extend(base.rdns.clone());
        Self { rdns }
    }

    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// All AVAs across all RDNs, in order — the walk `dnAttrs` uses.
    pub fn all_avas(&self) -> impl Iterator<Item = &Ava> {
        self.rdns.iter().flat_map(|r| r.avas.iter())
    }

    /// A case-folded canonical string form, suitable for ordered
    /// comparison (`distinguishedNameMatch`).
    pub fn to_canonical(&self) -> String {
        self.rdns
            .iter()
            .map(|r| {
                let mut avas: Vec<String> = r
                    .avas
                    .iter()
                    .map(|a| format!("{}={}", a.attr_type.to_ascii_lowercase(), a.attr_value.to_ascii_lowercase()))
                    .collect();
                avas.sort();
                avas.join("+")
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn rdn_eq_canonical(a: &Rdn, b: &Rdn) -> bool {
    let mut a: Vec<String> = a.avas.iter().map(|v| v.to_string().to_ascii_lowercase()).collect();
    let mut b: Vec<String> = b.avas.iter().map(|v| v.to_string().to_ascii_lowercase()).collect();
    a.sort();
    b.sort();
    a == b
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.rdns.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Builds a DN from parts, single-AVA-per-RDN only (the common case).
#[derive(Debug, Default)]
pub struct DnBuilder {
    rdns: Vec<Rdn>,
}

impl DnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, attr_type: impl Into<String>, attr_value: impl Into<String>) -> Self {
        self.rdns.push(Rdn {
            avas: vec![Ava::new(attr_type, attr_value)],
        });
        self
    }

    pub fn uid(self, value: impl Into<String>) -> Self {
        self.add("uid", value)
    }

    pub fn cn(self, value: impl Into<String>) -> Self {
        self.add("cn", value)
    }

    pub fn ou(self, value: impl Into<String>) -> Self {
        self.add("ou", value)
    }

    pub fn dc(self, value: impl Into<String>) -> Self {
        self.add("dc", value)
    }

    pub fn base(mut self, base: &str) -> Self {
        if let Ok(dn) = DistinguishedName::parse(base) {
            self.rdns.extend(dn.rdns);
        }
        self
    }

    pub fn build(self) -> DistinguishedName {
        DistinguishedName::from_rdns(self.rdns)
    }
}

/// Escapes special characters in a DN value according to RFC 4514.
pub fn escape_dn_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() * 2);
    for (i, c) in value.chars().enumerate() {
        match c {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            ' ' if i == 0 || i == value.len() - 1 => {
                result.push('\\');
                result.push(c);
            }
            '#' if i == 0 => {
                result.push('\\');
                result.push(c);
            }
            '=' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// Unescapes a DN value.
pub fn unescape_dn_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                None => {
                    result.push('\\');
                    break;
                }
                Some(n1) => {
                    if n1.is_ascii_hexdigit() {
                        if let Some(n2) = chars.next() {
                            if n2.is_ascii_hexdigit() {
                                if let Ok(byte) = u8::from_str_radix(&format!("{n1}{n2}"), 16) {
                                    result.push(byte as char);
                                    continue;
                                }
                            }
                            result.push(n1);
                            result.push(n2);
                            continue;
                        }
                        result.push(n1);
                        break;
                    }
                    result.push(n1);
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Splits `s` on unescaped occurrences of `sep`, trimming each part.
/// Used both for `,`-separated RDNs and `+`-separated AVAs within one RDN.
fn split_unescaped(s: &str, sep: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == sep {
            if !current.is_empty() {
                result.push(current.trim().to_string());
            }
            current = String::new();
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        result.push(current.trim().to_string());
    }
    result
}

/// Escapes special characters in an LDAP filter value according to RFC 4515.
pub fn escape_filter_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() * 3);
    for c in value.chars() {
        match c {
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\\' => result.push_str("\\5c"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_valued_rdns() {
        let dn = DistinguishedName::parse("uid=test,ou=users,dc=example,dc=com").unwrap();
        assert_eq!(dn.len(), 4);
        assert_eq!(dn.rdn_type(), Some("uid"));
        assert_eq!(dn.rdn_value(), Some("test"));
    }

    #[test]
    fn parses_multi_valued_rdn() {
        let dn = DistinguishedName::parse("cn=Alice+ou=Engineering,dc=example,dc=com").unwrap();
        assert_eq!(dn.rdns[0].avas.len(), 2);
        assert_eq!(dn.rdns[0].avas[0].attr_type, "cn");
        assert_eq!(dn.rdns[0].avas[1].attr_type, "ou");
    }

    #[test]
    fn display_roundtrips() {
        let dn = DistinguishedName::parse("uid=test,ou=users,dc=example,dc=com").unwrap();
        assert_eq!(dn.to_string(), "uid=test,ou=users,dc=example,dc=com");
    }

    #[test]
    fn parent_drops_first_rdn() {
        let dn = DistinguishedName::parse("uid=test,ou=users,dc=example,dc=com").unwrap();
        assert_eq!(dn.parent().unwrap().to_string(), "ou=users,dc=example,dc=com");
    }

    #[test]
    fn is_under_checks_suffix() {
        let dn = DistinguishedName::parse("uid=test,ou=users,dc=example,dc=com").unwrap();
        let base = DistinguishedName::parse("dc=example,dc=com").unwrap();
        let other = DistinguishedName::parse("dc=other,dc=com").unwrap();
        assert!(dn.is_under(&base));
        assert!(!dn.is_under(&other));
    }

    #[test]
    fn builder_matches_parsed_form() {
        let dn = DnBuilder::new().uid("testuser").ou("users").dc("example").dc("com").build();
        assert_eq!(dn.to_string(), "uid=testuser,ou=users,dc=example,dc=com");
    }

    #[test]
    fn escape_and_unescape_are_inverses() {
        assert_eq!(escape_dn_value("with,comma"), "with\\,comma");
        assert_eq!(unescape_dn_value("with\\,comma"), "with,comma");
        assert_eq!(escape_dn_value(" leading"), "\\ leading");
    }

    #[test]
    fn split_dn_respects_escaped_comma() {
        let dn = DistinguishedName::parse("cn=Test\\, User,ou=users,dc=example,dc=com").unwrap();
        assert_eq!(dn.len(), 4);
        assert_eq!(dn.rdn_value(), Some("Test, User"));
    }

    #[test]
    fn to_canonical_is_case_and_order_insensitive() {
        let a = DistinguishedName::parse("CN=Alice+OU=Eng,DC=Example,DC=Com").unwrap();
        let b = DistinguishedName::parse("ou=eng+cn=alice,dc=example,dc=com").unwrap();
        assert_eq!(a.to_canonical(), b.to_canonical());
    }

    #[test]
    fn all_avas_walks_every_rdn() {
        let dn = DistinguishedName::parse("cn=Alice+ou=Eng,dc=example,dc=com").unwrap();
        let avas: Vec<&str> = dn.all_avas().map(|a| a.attr_type.as_str()).collect();
        assert_eq!(avas, vec!["cn", "ou", "dc", "dc"]);
    }

    #[test]
    fn escape_filter_value_escapes_wildcards() {
        assert_eq!(escape_filter_value("with*wildcard"), "with\\2awildcard");
        assert_eq!(escape_filter_value("(parens)"), "\\28parens\\29");
    }
}
