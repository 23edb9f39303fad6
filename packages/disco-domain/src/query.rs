use serde::{Deserialize, Serialize};

/// Combination operator for values selected under the same facet key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
	#[default]
	#[serde(rename = "AND", alias = "and", alias = "And")]
	And,
	#[serde(rename = "OR", alias = "or", alias = "Or")]
	Or,
}
impl Operator {
	/// Token used by the catalogue's filter-query syntax, padded with spaces.
	pub fn token(self) -> &'static str {
		match self {
			Self::And => " AND ",
			Self::Or => " OR ",
		}
	}
}

/// One selected filter: which source group it targets, which field, and the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetTriple {
	pub facet_group: Option<String>,
	pub facet: Option<String>,
	pub value: Option<String>,
}
impl FacetTriple {
	pub fn new(
		facet_group: impl Into<String>,
		facet: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		Self {
			facet_group: Some(facet_group.into()),
			facet: Some(facet.into()),
			value: Some(value.into()),
		}
	}

	pub fn group(&self) -> Option<&str> {
		non_blank(self.facet_group.as_deref())
	}

	pub fn key(&self) -> Option<&str> {
		non_blank(self.facet.as_deref())
	}

	pub fn value(&self) -> Option<&str> {
		non_blank(self.value.as_deref())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
	pub query: Option<String>,
	pub facets: Vec<FacetTriple>,
	pub operator: Operator,
	pub sort: Option<String>,
	pub rows: Option<u32>,
	pub start: Option<u32>,
}
impl SearchQuery {
	/// Free-text term, if one was given.
	pub fn text(&self) -> Option<&str> {
		non_blank(self.query.as_deref())
	}

	/// Non-blank values of every triple tagged with `group`, in request order.
	pub fn group_values<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.facets
			.iter()
			.filter(move |facet| facet.group() == Some(group))
			.filter_map(FacetTriple::value)
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
