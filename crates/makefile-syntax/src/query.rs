//! Query dispatch: resolve user queries against a scanned Makefile.
//!
//! Lookup policy:
//!
//! - exact queries match target names case-sensitively (any defined target)
//!   and variable names case-insensitively; both kinds may match at once
//! - queries containing `*`, `?` or `[` are shell globs, matched against
//!   `.PHONY` targets and (case-insensitively) against variables
//! - an exact query with no match carries "did you mean" suggestions drawn
//!   from every defined target and variable

use crate::error::SyntaxError;
use crate::model::{Recipe, Variable};
use crate::scanner::Makefile;
use glob::{MatchOptions, Pattern};
use thiserror::Error;

/// Maximum number of suggestions offered for an unknown name.
pub const MAX_SUGGESTIONS: usize = 5;

/// Similarity ratio below which a name is not suggested.
pub const SIMILARITY_CUTOFF: f32 = 0.5;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("'{query}' not found as target or variable")]
    NotFound {
        query: String,
        suggestions: Vec<String>,
    },

    #[error("no targets or variables match pattern '{0}'")]
    NoMatch(String),

    #[error("invalid pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl QueryError {
    /// The user query this error refers to, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            QueryError::NotFound { query, .. } => Some(query),
            QueryError::NoMatch(query) => Some(query),
            QueryError::BadPattern { pattern, .. } => Some(pattern),
            QueryError::Syntax(_) => None,
        }
    }
}

/// Descriptions produced by one or more queries, targets and variables kept
/// apart so they can be printed as two groups.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    pub recipes: Vec<Recipe>,
    pub variables: Vec<Variable>,
}

impl Resolved {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.variables.is_empty()
    }

    pub fn extend(&mut self, other: Resolved) {
        self.recipes.extend(other.recipes);
        self.variables.extend(other.variables);
    }
}

/// True when the query should be treated as a shell glob.
pub fn is_pattern(query: &str) -> bool {
    query.contains(['*', '?', '['])
}

/// Describe every `.PHONY` target, in file order.
pub fn resolve_all(mf: &Makefile) -> Result<Resolved, SyntaxError> {
    let recipes = mf
        .phony_targets()
        .into_iter()
        .map(|target| Recipe::describe(mf, target))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Resolved {
        recipes,
        variables: Vec::new(),
    })
}

/// Resolve a single query, exact or wildcard.
pub fn resolve(mf: &Makefile, query: &str) -> Result<Resolved, QueryError> {
    if is_pattern(query) {
        resolve_pattern(mf, query)
    } else {
        resolve_exact(mf, query)
    }
}

fn resolve_exact(mf: &Makefile, query: &str) -> Result<Resolved, QueryError> {
    let mut resolved = Resolved::default();

    if mf.find_target(query).is_some() {
        resolved.recipes.push(Recipe::describe(mf, query)?);
    }
    if let Some((name, _)) = mf.find_variable_ignore_case(query) {
        resolved.variables.push(Variable::describe(mf, name)?);
    }

    if resolved.is_empty() {
        return Err(QueryError::NotFound {
            query: query.to_string(),
            suggestions: suggest(mf, query),
        });
    }
    Ok(resolved)
}

fn resolve_pattern(mf: &Makefile, query: &str) -> Result<Resolved, QueryError> {
    let pattern = Pattern::new(query).map_err(|source| QueryError::BadPattern {
        pattern: query.to_string(),
        source,
    })?;
    let ignore_case = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let recipes = mf
        .phony_targets()
        .into_iter()
        .filter(|target| pattern.matches(target))
        .map(|target| Recipe::describe(mf, target))
        .collect::<Result<Vec<_>, _>>()?;
    let variables = mf
        .variables()
        .names()
        .filter(|name| pattern.matches_with(name, ignore_case))
        .map(|name| Variable::describe(mf, name))
        .collect::<Result<Vec<_>, _>>()?;

    let resolved = Resolved { recipes, variables };
    if resolved.is_empty() {
        return Err(QueryError::NoMatch(query.to_string()));
    }
    Ok(resolved)
}

/// Names similar to `query`: closest matches by similarity ratio first,
/// then names containing `query` (case-insensitive), at most
/// [`MAX_SUGGESTIONS`] without duplicates.
pub fn suggest(mf: &Makefile, query: &str) -> Vec<String> {
    let mut pool: Vec<&str> = mf.targets().names().collect();
    pool.extend(mf.variables().names());

    let needle = query.to_lowercase();
    let similar = similar::get_close_matches(query, &pool[..], MAX_SUGGESTIONS, SIMILARITY_CUTOFF);
    let containing = pool
        .iter()
        .copied()
        .filter(|name| name.to_lowercase().contains(&needle));

    let mut suggestions: Vec<String> = Vec::new();
    for name in similar.into_iter().chain(containing) {
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
        if !suggestions.iter().any(|s| s == name) {
            suggestions.push(name.to_string());
        }
    }
    suggestions
}
