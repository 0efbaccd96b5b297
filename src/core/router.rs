use crate::utils::error::{AppError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use url::Url;

const DEFAULT_CONSTRAINT: &str = "[^/]+";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
    Optional(Vec<Part>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

#[derive(Debug, Clone)]
pub struct SegmentRouteBuilder {
    pattern: String,
    constraints: BTreeMap<String, String>,
    defaults: BTreeMap<String, String>,
}

impl SegmentRouteBuilder {
    pub fn constraint(mut self, param: &str, regex: &str) -> Self {
        self.constraints.insert(param.to_string(), regex.to_string());
        self
    }

    pub fn default_value(mut self, param: &str, value: &str) -> Self {
        self.defaults.insert(param.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Result<SegmentRoute> {
        let parts = parse_pattern(&self.pattern)?;

        let mut source = String::from("^");
        let mut names = Vec::new();
        write_regex(&parts, &self.constraints, &mut source, &mut names);
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| AppError::InvalidConfigValueError {
            field: "route".to_string(),
            value: self.pattern.clone(),
            reason: format!("Cannot compile route: {}", e),
        })?;

        tracing::debug!("Compiled route '{}' to {}", self.pattern, source);
        Ok(SegmentRoute {
            pattern: self.pattern,
            parts,
            defaults: self.defaults,
            names,
            regex,
        })
    }
}

/// Path route made of literal text, `:param` segments and `[...]` optional groups.
#[derive(Debug, Clone)]
pub struct SegmentRoute {
    pattern: String,
    parts: Vec<Part>,
    defaults: BTreeMap<String, String>,
    names: Vec<String>,
    regex: Regex,
}

impl SegmentRoute {
    pub fn builder(pattern: &str) -> SegmentRouteBuilder {
        SegmentRouteBuilder {
            pattern: pattern.to_string(),
            constraints: BTreeMap::new(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let captures = self.regex.captures(path)?;

        let mut params = self.defaults.clone();
        for name in &self.names {
            if let Some(value) = captures.name(name) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }

        Some(RouteMatch { params })
    }

    /// 接受完整 URL 或單純路徑，只比對 path 部分
    pub fn match_uri(&self, uri: &str) -> Result<Option<RouteMatch>> {
        if uri.starts_with('/') {
            let path = uri.split(['?', '#']).next().unwrap_or(uri);
            return Ok(self.match_path(path));
        }

        let url = Url::parse(uri).map_err(|e| AppError::InvalidInput {
            message: format!("'{}' is not a valid URI: {}", uri, e),
        })?;
        Ok(self.match_path(url.path()))
    }

    pub fn assemble(&self, params: &BTreeMap<String, String>) -> Result<String> {
        let (path, _) = self
            .assemble_parts(&self.parts, params, false)?
            .unwrap_or_default();
        Ok(path)
    }

    /// Returns `None` when an optional group lacks a parameter. The flag tells
    /// whether any non-default value was used.
    fn assemble_parts(
        &self,
        parts: &[Part],
        params: &BTreeMap<String, String>,
        optional: bool,
    ) -> Result<Option<(String, bool)>> {
        let mut out = String::new();
        let mut explicit = false;

        for part in parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Param(name) => match (params.get(name), self.defaults.get(name)) {
                    (Some(value), default) => {
                        if default != Some(value) {
                            explicit = true;
                        }
                        out.push_str(value);
                    }
                    (None, Some(default)) => out.push_str(default),
                    (None, None) if optional => return Ok(None),
                    (None, None) => {
                        return Err(AppError::RouteAssemblyError {
                            route: self.pattern.clone(),
                            reason: format!("missing parameter '{}'", name),
                        })
                    }
                },
                Part::Optional(inner) => {
                    if let Some((text, inner_explicit)) = self.assemble_parts(inner, params, true)? {
                        if inner_explicit {
                            out.push_str(&text);
                            explicit = true;
                        }
                    }
                }
            }
        }

        Ok(Some((out, explicit)))
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Part>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut pos = 0;
    let parts = parse_parts(pattern, &chars, &mut pos, 0)?;
    Ok(parts)
}

fn parse_parts(pattern: &str, chars: &[char], pos: &mut usize, depth: usize) -> Result<Vec<Part>> {
    let invalid = |reason: &str| AppError::InvalidConfigValueError {
        field: "route".to_string(),
        value: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = Vec::new();
    let mut literal = String::new();

    while *pos < chars.len() {
        match chars[*pos] {
            ':' => {
                *pos += 1;
                let start = *pos;
                while *pos < chars.len() && (chars[*pos].is_ascii_alphanumeric() || chars[*pos] == '_') {
                    *pos += 1;
                }
                if start == *pos {
                    return Err(invalid("parameter name expected after ':'"));
                }
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                parts.push(Part::Param(chars[start..*pos].iter().collect()));
            }
            '[' => {
                *pos += 1;
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                let inner = parse_parts(pattern, chars, pos, depth + 1)?;
                parts.push(Part::Optional(inner));
            }
            ']' => {
                if depth == 0 {
                    return Err(invalid("unbalanced ']'"));
                }
                *pos += 1;
                if !literal.is_empty() {
                    parts.push(Part::Literal(literal));
                }
                return Ok(parts);
            }
            c => {
                literal.push(c);
                *pos += 1;
            }
        }
    }

    if depth > 0 {
        return Err(invalid("unterminated optional group"));
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}

fn write_regex(
    parts: &[Part],
    constraints: &BTreeMap<String, String>,
    out: &mut String,
    names: &mut Vec<String>,
) {
    for part in parts {
        match part {
            Part::Literal(text) => out.push_str(&regex::escape(text)),
            Part::Param(name) => {
                let constraint = constraints
                    .get(name)
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CONSTRAINT);
                out.push_str(&format!("(?P<{}>(?:{}))", name, constraint));
                names.push(name.clone());
            }
            Part::Optional(inner) => {
                out.push_str("(?:");
                write_regex(inner, constraints, out, names);
                out.push_str(")?");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_route() -> SegmentRoute {
        SegmentRoute::builder("/:controller")
            .constraint("controller", "[A-Za-z]+")
            .build()
            .unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_constrained_segment() {
        let route = controller_route();
        assert_eq!(route.pattern(), "/:controller");
        let matched = route.match_path("/Index").unwrap();
        assert_eq!(matched.param("controller"), Some("Index"));

        assert!(route.match_path("/index1").is_none());
        assert!(route.match_path("/a/b").is_none());
        assert!(route.match_path("/").is_none());
    }

    #[test]
    fn test_match_uri_uses_path_only() {
        let route = controller_route();
        assert!(route.match_uri("http://localhost/album").unwrap().is_some());
        assert!(route.match_uri("http://localhost/album?x=1").unwrap().is_some());
        assert!(route.match_uri("/album#top").unwrap().is_some());
        assert!(route.match_uri("http://localhost/album2").unwrap().is_none());
        assert!(route.match_uri("not a uri").is_err());
    }

    #[test]
    fn test_optional_group_and_defaults() {
        let route = SegmentRoute::builder("/mini[/:action[/:id]]")
            .constraint("action", "[a-z]+")
            .constraint("id", "[0-9]+")
            .default_value("action", "index")
            .build()
            .unwrap();

        assert_eq!(
            route.match_path("/mini").unwrap().params(),
            &params(&[("action", "index")])
        );

        let matched = route.match_path("/mini/form/42").unwrap();
        assert_eq!(matched.params(), &params(&[("action", "form"), ("id", "42")]));

        assert!(route.match_path("/mini/form/abc").is_none());
        assert!(route.match_path("/mini/").is_none());
    }

    #[test]
    fn test_assemble() {
        let route = SegmentRoute::builder("/mini[/:action[/:id]]")
            .default_value("action", "index")
            .build()
            .unwrap();

        assert_eq!(route.assemble(&params(&[])).unwrap(), "/mini");
        assert_eq!(route.assemble(&params(&[("action", "index")])).unwrap(), "/mini");
        assert_eq!(route.assemble(&params(&[("action", "form")])).unwrap(), "/mini/form");
        assert_eq!(
            route.assemble(&params(&[("action", "form"), ("id", "7")])).unwrap(),
            "/mini/form/7"
        );

        assert!(controller_route().assemble(&params(&[])).is_err());
        assert_eq!(
            controller_route().assemble(&params(&[("controller", "index")])).unwrap(),
            "/index"
        );
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(SegmentRoute::builder("/mini[/:action").build().is_err());
        assert!(SegmentRoute::builder("/mini]").build().is_err());
        assert!(SegmentRoute::builder("/:").build().is_err());
        assert!(SegmentRoute::builder("/:a")
            .constraint("a", "(")
            .build()
            .is_err());
    }

    #[test]
    fn test_literal_regex_characters_are_escaped() {
        let route = SegmentRoute::builder("/v1.0/:name").build().unwrap();
        assert!(route.match_path("/v1.0/x").is_some());
        assert!(route.match_path("/v1x0/x").is_none());
    }
}
