use clap::{Args, ValueEnum};
use pagemark::paginate::errors::PaginateError;
use pagemark::paginate::{
    OverwritePolicy, Progress, ProgressStage, output_path, write_book,
};
use pagemark::{
    BreakMode, Epub, Outcome, Pages, PaginationRequest, Paginator, SpinePlacement,
};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Arguments of a pagination run.
#[derive(Debug, Args)]
pub struct Paginate {
    /// Path to the EPUB file you wish to paginate
    pub filepath: PathBuf,

    /// The number of pages you want to add to the book, `bookstats` for
    /// text statistics, or a page size together with --autopage
    pub pages: String,

    /// Define how to divide pages. "chars" uses a fixed number of
    /// characters per page, "words" a fixed number of words, "lines" a
    /// fixed number of lines/paragraphs. Enter a number to use the
    /// "lines" mode with a maximum number of characters per line
    #[arg(short = 'p', long = "pagingmode", default_value = "chars")]
    pub paging_mode: String,

    /// Behavior if a pagebreak is generated in the middle of a word;
    /// 'next' goes to the next whitespace, 'prev' to the previous,
    /// 'split' will keep the break inside the word
    #[arg(short = 'b', long = "breakmode", value_enum, default_value_t = BreakModeArg::Next)]
    pub break_mode: BreakModeArg,

    /// A list of page numbers to be mapped to the ebook's chapter
    /// markers, one entry per ToC item; 0 skips an item
    #[arg(short = 't', long = "tocpages", num_args = 1..)]
    pub toc_pages: Vec<String>,

    /// Roman numbered front matter: a count, a roman numeral, or `auto`
    #[arg(short = 'r', long = "romanfrontmatter")]
    pub roman: Option<String>,

    /// Placement of non-linear spine documents in the pagination order
    #[arg(long, value_enum, default_value_t = PlacementArg::Append)]
    pub nonlinear: PlacementArg,

    /// Placement of documents absent from the spine
    #[arg(long, value_enum, default_value_t = PlacementArg::Append)]
    pub unlisted: PlacementArg,

    /// Suffix for the newly generated EPUB file
    #[arg(short, long, default_value = "_paginated")]
    pub suffix: String,

    /// A new name for the newly generated EPUB file.
    /// Overrides the --suffix argument
    #[arg(short, long)]
    pub name: Option<String>,

    /// Save path for the output file. Does not include the file name
    #[arg(short, long)]
    pub outpath: Option<PathBuf>,

    /// Do not insert a pageList element into the EPUB2 ToC NCX file
    #[arg(long = "noncx")]
    pub no_ncx: bool,

    /// Do not insert a page-list nav element into the EPUB3 navigation file
    #[arg(long = "nonav")]
    pub no_nav: bool,

    /// Also generate an Adobe page-map.xml and reference it from the OPF
    #[arg(long = "page-map")]
    pub page_map: bool,

    /// Interpret `pages` as a page size and derive the page count
    #[arg(long)]
    pub autopage: bool,

    /// Print the derived page count and exit without writing anything
    #[arg(long)]
    pub suggest: bool,

    /// Selector for page markers already present in the book
    /// (`Tag.class[attr=value]#id`); rebuilds navigation from them
    #[arg(long = "pagetag")]
    pub page_tag: Option<String>,

    /// Attribute holding the page number of a matched page marker
    #[arg(long = "pageattribute")]
    pub page_attribute: Option<String>,

    /// What to do when the book already has a page list
    #[arg(long, value_enum, default_value_t = OverwriteArg::Ask)]
    pub overwrite: OverwriteArg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BreakModeArg {
    Next,
    Prev,
    Split,
}

impl From<BreakModeArg> for BreakMode {
    fn from(mode: BreakModeArg) -> Self {
        match mode {
            BreakModeArg::Next => Self::Next,
            BreakModeArg::Prev => Self::Prev,
            BreakModeArg::Split => Self::Split,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlacementArg {
    Append,
    Prepend,
    Ignore,
}

impl From<PlacementArg> for SpinePlacement {
    fn from(placement: PlacementArg) -> Self {
        match placement {
            PlacementArg::Append => Self::Append,
            PlacementArg::Prepend => Self::Prepend,
            PlacementArg::Ignore => Self::Ignore,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OverwriteArg {
    Ask,
    Force,
    Abort,
}

impl From<OverwriteArg> for OverwritePolicy {
    fn from(policy: OverwriteArg) -> Self {
        match policy {
            OverwriteArg::Ask => Self::Ask,
            OverwriteArg::Force => Self::Overwrite,
            OverwriteArg::Abort => Self::Abort,
        }
    }
}

impl Paginate {
    pub fn run(self) -> ExitCode {
        match self.execute() {
            Ok(code) => code,
            Err(error) => {
                eprintln!("{error}");
                ExitCode::FAILURE
            }
        }
    }

    fn execute(&self) -> Result<ExitCode, Box<dyn Error>> {
        let request = self.to_request()?;
        log::debug!("pagination request: {request:?}");

        let epub = Epub::open(&self.filepath)?;
        let progress = ConsoleProgress;
        let paginator = Paginator::new(&epub, request)
            .with_prompt(&ask_user)
            .with_progress(&progress);

        match paginator.run()? {
            Outcome::Stats(stats) => {
                println!("{} characters", stats.characters);
                println!("{} lines", stats.lines);
                println!("{} words", stats.words);
            }
            Outcome::Suggestion(pages) => {
                println!("suggested page count: {pages}");
            }
            Outcome::Cancelled => {
                println!("Pagination Cancelled");
            }
            Outcome::Paginated(book) => {
                let destination = output_path(
                    &self.filepath,
                    self.outpath.as_deref(),
                    self.name.as_deref(),
                    &self.suffix,
                );
                write_book(&epub, &book, &destination)?;
                println!(
                    "successfully saved {} with {} pages",
                    destination.display(),
                    book.records.len()
                );
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn to_request(&self) -> Result<PaginationRequest, PaginateError> {
        let pages = if self.pages == "bookstats" {
            Pages::Stats
        } else if let Ok(value) = self.pages.parse::<usize>() {
            if self.autopage {
                Pages::Auto(value)
            } else {
                Pages::Count(value)
            }
        } else if self.page_tag.is_some() {
            Pages::Identify
        } else {
            return Err(PaginateError::InvalidInput(format!(
                "`{}` is not a page count, `bookstats`, or an identify-mode marker",
                self.pages
            )));
        };

        let mut request = PaginationRequest::new(pages);
        request.page_mode = self.paging_mode.parse()?;
        request.break_mode = self.break_mode.into();
        if !self.toc_pages.is_empty() {
            request.toc_map = Some(
                self.toc_pages
                    .iter()
                    .map(|entry| entry.parse())
                    .collect::<Result<_, _>>()?,
            );
        }
        if let Some(roman) = &self.roman {
            request.roman = roman.parse()?;
        }
        request.nonlinear = self.nonlinear.into();
        request.unlisted = self.unlisted.into();
        request.write_ncx = !self.no_ncx;
        request.write_nav = !self.no_nav;
        request.adobe_page_map = self.page_map;
        request.suggest = self.suggest;
        request.page_selector = self.page_tag.clone();
        request.page_attribute = self.page_attribute.clone();
        request.overwrite = self.overwrite.into();
        Ok(request)
    }
}

fn ask_user(message: &str) -> bool {
    print!("{message} [y/N]:");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn on_progress(&self, stage: ProgressStage, done: usize, total: usize) {
        let label = match stage {
            ProgressStage::Parse => "Parsing HTML",
            ProgressStage::Map => "Mapping page",
        };
        print_progress_bar(done, total, &format!("{label} {done} of {total}"), "Done");
    }
}

fn print_progress_bar(iteration: usize, total: usize, prefix: &str, suffix: &str) {
    const LENGTH: usize = 60;

    let total = total.max(1);
    let percent = 100.0 * iteration as f64 / total as f64;
    let filled = (LENGTH * iteration / total).min(LENGTH);
    let bar = "\u{2588}".repeat(filled) + &"-".repeat(LENGTH - filled);

    print!("\r{prefix} |{bar}| {percent:.2}% {suffix}");
    let _ = io::stdout().flush();
    if iteration >= total {
        println!();
    }
}
