use clap::ValueEnum;
use varlens::{Category, PeopleFilter, SizeBucket, SortMode, SourceFilter, SubFilter};

/// Browsing categories accepted via the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum CategoryArg {
	Scene,
	Pose,
	Clothing,
	Hair,
	Appearance,
	Other,
}

impl From<CategoryArg> for Category {
	fn from(value: CategoryArg) -> Self {
		match value {
			CategoryArg::Scene => Category::Scene,
			CategoryArg::Pose => Category::Pose,
			CategoryArg::Clothing => Category::Clothing,
			CategoryArg::Hair => Category::Hair,
			CategoryArg::Appearance => Category::Appearance,
			CategoryArg::Other => Category::Other,
		}
	}
}

/// Sub-filter bits selectable from the CLI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SubFilterArg {
	Female,
	Male,
	Unisex,
	Items,
	Presets,
}

impl SubFilterArg {
	pub(crate) fn bit(self) -> SubFilter {
		match self {
			SubFilterArg::Female => SubFilter::FEMALE,
			SubFilterArg::Male => SubFilter::MALE,
			SubFilterArg::Unisex => SubFilter::UNISEX,
			SubFilterArg::Items => SubFilter::ITEMS,
			SubFilterArg::Presets => SubFilter::PRESETS,
		}
	}
}

/// Occupant-count selections.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum PeopleArg {
	Single,
	Dual,
}

impl PeopleArg {
	pub(crate) fn bit(self) -> PeopleFilter {
		match self {
			PeopleArg::Single => PeopleFilter::SINGLE,
			PeopleArg::Dual => PeopleFilter::DUAL,
		}
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SizeArg {
	Small,
	Medium,
	Large,
	Huge,
}

impl From<SizeArg> for SizeBucket {
	fn from(value: SizeArg) -> Self {
		match value {
			SizeArg::Small => SizeBucket::Small,
			SizeArg::Medium => SizeBucket::Medium,
			SizeArg::Large => SizeBucket::Large,
			SizeArg::Huge => SizeBucket::Huge,
		}
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SourceArg {
	All,
	Packaged,
	Loose,
}

impl From<SourceArg> for SourceFilter {
	fn from(value: SourceArg) -> Self {
		match value {
			SourceArg::All => SourceFilter::All,
			SourceArg::Packaged => SourceFilter::Packaged,
			SourceArg::Loose => SourceFilter::Loose,
		}
	}
}

/// Result orderings accepted via the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum SortArg {
	NameAsc,
	NameDesc,
	DateNewest,
	DateOldest,
	SizeLargest,
	SizeSmallest,
}

impl From<SortArg> for SortMode {
	fn from(value: SortArg) -> Self {
		match value {
			SortArg::NameAsc => SortMode::NameAsc,
			SortArg::NameDesc => SortMode::NameDesc,
			SortArg::DateNewest => SortMode::DateNewest,
			SortArg::DateOldest => SortMode::DateOldest,
			SortArg::SizeLargest => SortMode::SizeLargest,
			SortArg::SizeSmallest => SortMode::SizeSmallest,
		}
	}
}

/// Output formats supported by the CLI utility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
	Plain,
	Json,
	/// Page laid out through the virtualized grid.
	Grid,
}
