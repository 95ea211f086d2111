//! Typed classification of entry paths for the category sub-filters.

use crate::entry::extension_of;

/// Gender a resource is authored for, read from its folder layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
	Female,
	Male,
	Unisex,
}

/// What kind of resource a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	/// Authored item files (`.vam`, `.vaj`, `.vab`).
	Item,
	/// Saved presets (`.vap`).
	Preset,
	Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Classification {
	pub gender: Gender,
	pub resource: ResourceKind,
}

/// Classify `path` by extension and `female`/`male` folder segments.
#[must_use]
pub fn classify(path: &str) -> Classification {
	Classification {
		gender: gender_of(path),
		resource: resource_kind_of(path),
	}
}

/// Resource kind implied by the extension of `path`.
#[must_use]
pub fn resource_kind_of(path: &str) -> ResourceKind {
	match extension_of(path) {
		Some(ext) if is_any(ext, &["vam", "vaj", "vab"]) => ResourceKind::Item,
		Some(ext) if ext.eq_ignore_ascii_case("vap") => ResourceKind::Preset,
		_ => ResourceKind::Other,
	}
}

/// Gender implied by a `female` or `male` directory segment of `path`.
#[must_use]
pub fn gender_of(path: &str) -> Gender {
	let mut segments = path.split(['/', ':']).rev().skip(1);
	segments
		.find_map(|segment| {
			if segment.eq_ignore_ascii_case("female") {
				Some(Gender::Female)
			} else if segment.eq_ignore_ascii_case("male") {
				Some(Gender::Male)
			} else {
				None
			}
		})
		.unwrap_or(Gender::Unisex)
}

fn is_any(ext: &str, candidates: &[&str]) -> bool {
	candidates
		.iter()
		.any(|candidate| ext.eq_ignore_ascii_case(candidate))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_gender_from_directory_segments() {
		assert_eq!(gender_of("Custom/Clothing/Female/Author/top.vam"), Gender::Female);
		assert_eq!(gender_of("pkg.var:Custom/Hair/Male/short.vam"), Gender::Male);
		assert_eq!(gender_of("Custom/Clothing/Unisex/hat.vam"), Gender::Unisex);
	}

	#[test]
	fn file_names_do_not_count_as_segments() {
		assert_eq!(gender_of("Custom/Clothing/female"), Gender::Unisex);
		assert_eq!(gender_of("Custom/Clothing/males/shirt.vam"), Gender::Unisex);
	}

	#[test]
	fn classifies_resource_kinds() {
		assert_eq!(resource_kind_of("a/b.VAM"), ResourceKind::Item);
		assert_eq!(resource_kind_of("a/b.vaj"), ResourceKind::Item);
		assert_eq!(resource_kind_of("a/b.vap"), ResourceKind::Preset);
		assert_eq!(resource_kind_of("a/b.json"), ResourceKind::Other);
		assert_eq!(
			classify("Custom/Clothing/Female/x.vap"),
			Classification {
				gender: Gender::Female,
				resource: ResourceKind::Preset,
			}
		);
	}
}
