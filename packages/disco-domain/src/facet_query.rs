//! Renders selected facets into the catalogue's `key:("v1" OP "v2")` filter-query syntax.

use crate::query::{Operator, SearchQuery};

/// Builds the filter expression for the triples tagged with one facet group.
#[derive(Debug, Clone)]
pub struct FacetQueryBuilder {
	group: String,
}
impl FacetQueryBuilder {
	pub fn new(group: impl Into<String>) -> Self {
		Self { group: group.into() }
	}

	pub fn group(&self) -> &str {
		&self.group
	}

	pub fn build(&self, query: &SearchQuery) -> String {
		let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();

		for facet in &query.facets {
			if facet.group() != Some(self.group.as_str()) {
				continue;
			}

			let (Some(key), Some(value)) = (facet.key(), facet.value()) else {
				continue;
			};

			match grouped.iter_mut().find(|(existing, _)| *existing == key) {
				Some((_, values)) => values.push(value),
				None => grouped.push((key, vec![value])),
			}
		}

		grouped
			.into_iter()
			.map(|(key, values)| build_clause(key, &values, query.operator))
			.collect::<Vec<_>>()
			.join(query.operator.token())
	}
}

/// Renders a single `key:("v1" OP "v2")` clause.
pub fn build_clause<S>(key: &str, values: &[S], operator: Operator) -> String
where
	S: AsRef<str>,
{
	let quoted =
		values.iter().map(|value| quote(value.as_ref())).collect::<Vec<_>>().join(operator.token());

	format!("{key}:({quoted})")
}

fn quote(value: &str) -> String {
	let mut out = String::with_capacity(value.len() + 2);

	out.push('"');

	for ch in value.chars() {
		if matches!(ch, '"' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('"');

	out
}
