use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;
use log::debug;

use super::{FilesystemOptions, LooseFile};
use crate::entry::PACKAGE_SEPARATOR;

/// Build a configured walker for `dir` using the library's options.
pub(crate) fn build_walk(dir: &Path, options: &FilesystemOptions) -> WalkBuilder {
	let ignores = options.global_ignore_set();
	let mut walker = WalkBuilder::new(dir);

	walker
		.hidden(!options.include_hidden)
		.follow_links(options.follow_symlinks)
		.git_ignore(options.git_ignore)
		.git_global(false)
		.git_exclude(false)
		.ignore(options.respect_ignore_files)
		.parents(false)
		.max_depth(options.max_depth);

	if !ignores.is_empty() {
		let ignores = Arc::new(ignores);
		walker.filter_entry(move |entry| !ignores.contains(entry.file_name()));
	}

	walker
}

/// Walk loose files below `root`, restricted to the directories named by `scopes`.
///
/// Returns `false` when `visit` asked to stop.
pub(crate) fn walk_loose(
	root: &Path,
	scopes: &[String],
	options: &FilesystemOptions,
	visit: &mut dyn FnMut(LooseFile) -> bool,
) -> bool {
	for dir in scope_directories(scopes) {
		let start = if dir.is_empty() {
			root.to_path_buf()
		} else {
			root.join(&dir)
		};
		if !start.is_dir() {
			continue;
		}

		for item in build_walk(&start, options).build() {
			let entry = match item {
				Ok(entry) => entry,
				Err(err) => {
					debug!("skipping unreadable loose entry: {err}");
					continue;
				}
			};
			if !entry.file_type().is_some_and(|kind| kind.is_file()) {
				continue;
			}

			let path = entry.path();
			let relative = path.strip_prefix(root).unwrap_or(path);
			let (size, modified) = match entry.metadata() {
				Ok(metadata) => {
					let modified = metadata
						.modified()
						.ok()
						.and_then(|time| time.duration_since(UNIX_EPOCH).ok())
						.map_or(0, |age| age.as_secs());
					(metadata.len(), modified)
				}
				Err(err) => {
					debug!("no metadata for {}: {err}", path.display());
					(0, 0)
				}
			};

			let file = LooseFile {
				path: relative.to_string_lossy().replace('\\', "/"),
				size,
				modified,
			};
			if !visit(file) {
				return false;
			}
		}
	}

	true
}

/// Directories (relative to the root) that can contain entries matching `scopes`.
///
/// Scopes naming a package path never match loose files. A scope without a
/// directory part, or an empty scope list, covers the whole root (`""`).
pub(crate) fn scope_directories(scopes: &[String]) -> Vec<String> {
	if scopes.is_empty() {
		return vec![String::new()];
	}

	let mut dirs: Vec<String> = scopes
		.iter()
		.filter(|scope| !scope.contains(PACKAGE_SEPARATOR))
		.map(|scope| {
			let scope = scope.replace('\\', "/");
			match scope.rfind('/') {
				Some(index) => scope[..index].trim_matches('/').to_string(),
				None => String::new(),
			}
		})
		.collect();

	if dirs.iter().any(String::is_empty) {
		return vec![String::new()];
	}

	dirs.sort();
	dirs.dedup();

	let mut covered: Vec<String> = Vec::with_capacity(dirs.len());
	for dir in dirs {
		let nested = covered
			.iter()
			.any(|parent| dir.strip_prefix(parent.as_str()).is_some_and(|rest| rest.starts_with('/')));
		if !nested {
			covered.push(dir);
		}
	}
	covered
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::tempdir;

	use super::*;

	fn scopes(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn scope_directories_collapse_nested_and_partial_prefixes() {
		assert_eq!(scope_directories(&[]), vec![String::new()]);
		assert_eq!(
			scope_directories(&scopes(&["Custom/Clothing/", "Custom/Clothing/Female/", "Saves/scene/duo"])),
			scopes(&["Custom/Clothing", "Saves/scene"])
		);
		assert_eq!(scope_directories(&scopes(&["A/", "top"])), vec![String::new()]);
		assert!(scope_directories(&scopes(&["pkg.var:Saves/"])).is_empty());
	}

	#[test]
	fn walks_only_scoped_directories() {
		let dir = tempdir().expect("tempdir");
		let root = dir.path();
		fs::create_dir_all(root.join("A/sub")).expect("mkdir A");
		fs::create_dir_all(root.join("B")).expect("mkdir B");
		fs::write(root.join("A/x.json"), b"{}").expect("write");
		fs::write(root.join("A/sub/y.json"), b"{}").expect("write");
		fs::write(root.join("B/z.vap"), b"{}").expect("write");

		let mut seen = Vec::new();
		let finished = walk_loose(root, &scopes(&["A/"]), &FilesystemOptions::default(), &mut |file| {
			seen.push(file.path);
			true
		});
		seen.sort();

		assert!(finished);
		assert_eq!(seen, scopes(&["A/sub/y.json", "A/x.json"]));
	}

	#[test]
	fn visitor_can_stop_the_walk() {
		let dir = tempdir().expect("tempdir");
		for name in ["a.json", "b.json", "c.json"] {
			fs::write(dir.path().join(name), b"{}").expect("write");
		}

		let mut visits = 0;
		let finished = walk_loose(dir.path(), &[], &FilesystemOptions::default(), &mut |_| {
			visits += 1;
			false
		});
		assert!(!finished);
		assert_eq!(visits, 1);
	}
}
