//! docx-stamp CLI: rebuild a DOCX with a GOST title block, or pull out its text and images.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use docx_stamp::{Error, ExtractedImage, MediaStore, TitleBlockFields};

#[derive(Parser)]
#[command(name = "docx-stamp")]
#[command(version)]
#[command(
    about = "Rebuild DOCX files with an engineering title block in the footer",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a document with the title block
    Stamp {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to <document code>.docx next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Print the document text and save its images
    Extract {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Directory for extracted images (images are only listed if omitted)
        #[arg(short, long, value_name = "DIR")]
        images: Option<PathBuf>,
    },
}

/// Title block values. Flags override values read from `--fields`.
#[derive(Args)]
struct FieldArgs {
    /// JSON file with title block fields (camelCase keys)
    #[arg(long, value_name = "FILE", env = "DOCX_STAMP_FIELDS")]
    fields: Option<PathBuf>,

    /// Document code, e.g. "АБВГ.123456.001 ПЗ"
    #[arg(long, env = "DOCX_STAMP_DOCUMENT_CODE")]
    document_code: Option<String>,

    /// Document title
    #[arg(long, env = "DOCX_STAMP_DOCUMENT_TITLE")]
    document_title: Option<String>,

    /// Organization name; "\n" separates lines
    #[arg(long, env = "DOCX_STAMP_ORGANIZATION")]
    organization: Option<String>,

    /// Literature code (e.g. "У", "О1")
    #[arg(long, env = "DOCX_STAMP_LITERATURE")]
    literature: Option<String>,

    /// Разраб.
    #[arg(long, env = "DOCX_STAMP_PREPARER")]
    preparer: Option<String>,

    /// Пров.
    #[arg(long, env = "DOCX_STAMP_REVIEWER")]
    reviewer: Option<String>,

    /// Н.контр.
    #[arg(long, env = "DOCX_STAMP_TECHNICAL_CONTROLLER")]
    technical_controller: Option<String>,

    /// Утв.
    #[arg(long, env = "DOCX_STAMP_APPROVER")]
    approver: Option<String>,
}

impl FieldArgs {
    fn resolve(self) -> Result<TitleBlockFields, Error> {
        let file = match &self.fields {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    Error::Io(io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
                })?;
                let fields: TitleBlockFields = serde_json::from_str(&text).map_err(|e| {
                    Error::InvalidFields(format!("{}: {e}", path.display()))
                })?;
                Some(fields)
            }
            None => None,
        };

        let required = |flag: Option<String>, from_file: Option<&String>, name: &str| {
            flag.or_else(|| from_file.cloned()).ok_or_else(|| {
                Error::InvalidFields(format!("missing --{name} (or a --fields file)"))
            })
        };
        let optional = |flag: Option<String>, from_file: Option<&String>| {
            flag.or_else(|| from_file.cloned()).unwrap_or_default()
        };
        let f = file.as_ref();

        Ok(TitleBlockFields {
            document_code: required(
                self.document_code,
                f.map(|f| &f.document_code),
                "document-code",
            )?,
            document_title: required(
                self.document_title,
                f.map(|f| &f.document_title),
                "document-title",
            )?,
            organization_name: required(
                self.organization.map(|o| o.replace("\\n", "\n")),
                f.map(|f| &f.organization_name),
                "organization",
            )?,
            literature_code: required(
                self.literature,
                f.map(|f| &f.literature_code),
                "literature",
            )?,
            preparer: optional(self.preparer, f.map(|f| &f.preparer)),
            reviewer: optional(self.reviewer, f.map(|f| &f.reviewer)),
            technical_controller: optional(
                self.technical_controller,
                f.map(|f| &f.technical_controller),
            ),
            approver: optional(self.approver, f.map(|f| &f.approver)),
        })
    }
}

/// Writes each image into a directory and reports its path.
struct DirectoryStore {
    dir: PathBuf,
}

impl MediaStore for DirectoryStore {
    type Error = io::Error;

    fn store(&mut self, image: &ExtractedImage) -> Result<String, io::Error> {
        let path = self.dir.join(&image.file_name);
        fs::write(&path, &image.data)?;
        Ok(path.display().to_string())
    }
}

fn cmd_stamp(input: &Path, output: Option<&Path>, fields: FieldArgs) -> Result<(), Error> {
    let fields = fields.resolve()?;
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(docx_stamp::suggested_file_name(&fields.document_code)),
    };

    let stamped = docx_stamp::stamp_docx(input, &output, &fields)?;
    if stamped.warnings.total() > 0 {
        eprintln!(
            "{} relationship warning(s): {} unresolved, {} media dropped",
            stamped.warnings.total(),
            stamped.warnings.unresolved_relationships,
            stamped.warnings.dropped_media
        );
    }
    println!("{}", output.display());
    Ok(())
}

fn cmd_extract(input: &Path, images: Option<&Path>) -> Result<(), Error> {
    let data = fs::read(input).map_err(|e| {
        Error::Io(io::Error::new(e.kind(), format!("{}: {}", e, input.display())))
    })?;

    match images {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let mut store = DirectoryStore {
                dir: dir.to_path_buf(),
            };
            let extracted = docx_stamp::extract_docx_with_store(&data, &mut store)?;
            println!("{}", extracted.text);
            for url in &extracted.image_urls {
                eprintln!("saved {url}");
            }
        }
        None => {
            let extraction = docx_stamp::extract_docx_bytes(&data)?;
            println!("{}", extraction.text);
            for image in &extraction.images {
                eprintln!(
                    "{} {} ({}, {} bytes)",
                    image.rel_id,
                    image.file_name,
                    image.content_type(),
                    image.data.len()
                );
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stamp {
            input,
            output,
            fields,
        } => cmd_stamp(&input, output.as_deref(), fields),
        Commands::Extract { input, images } => cmd_extract(&input, images.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
