//! Command-line parsing and the commands themselves.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reel_ai::{
    group_by_name, name_groups, ChatNamingConfig, ChatNamingService, KeywordNamingService,
};
use reel_engine::{EditorSession, EngineConfig, HeadlessSurface};
use reel_media::{Container, ExportCancel, FfprobeProber, Prober};
use reel_timeline::{ElementKind, Project, ProjectFile};
use tracing::{info, warn};

/// Reel - timeline engine front end
///
/// Inspects project files, probes media, groups clips and drives exports.
#[derive(Debug, Parser)]
#[command(name = "reel")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Engine config file (defaults to the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Write an empty project
    New {
        project: PathBuf,
        #[arg(default_value = "Untitled")]
        name: String,
    },
    /// Summarize timelines, elements and animations
    Info { project: PathBuf },
    /// Print probed media metadata as JSON
    Probe { media: PathBuf },
    /// Group files by name and name each group
    Group {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Print the FFmpeg arguments of an export
    ExportArgs { project: PathBuf, output: PathBuf },
    /// Encode background-colour frames and the mixed audio track with FFmpeg
    ///
    /// Element pixels are not rendered; the video stream only carries the
    /// project background.
    Export { project: PathBuf, output: PathBuf },
    /// Print the effective engine config
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load_or_default(cli.config.as_deref());
    match cli.command {
        Command::New { project, name } => {
            ProjectFile::new(Project::new(name)).save_to_file(&project)?;
            info!(path = %project.display(), "Created project");
        }
        Command::Info { project } => {
            let file = ProjectFile::load_from_file(&project)
                .with_context(|| format!("loading {}", project.display()))?;
            print!("{}", describe(&file.project));
        }
        Command::Probe { media } => {
            let info = FfprobeProber::new().probe(&media)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Group { files } => {
            for (name, videos) in group_files(&files)? {
                println!("{name}: {}", videos.join(", "));
            }
        }
        Command::ExportArgs { project, output } => {
            let session = open_session(&project, &output, config)?;
            println!("ffmpeg {}", session.export_job(&output).ffmpeg_args().join(" "));
        }
        Command::Export { project, output } => {
            let session = open_session(&project, &output, config)?;
            let job = session.export_job(&output);
            let mut frames = session.export_frames()?;
            job.run(
                &mut frames,
                |p| info!(frame = p.current_frame, total = p.total_frames, "Exporting"),
                &ExportCancel::new(),
            )?;
            info!(output = %output.display(), "Export finished");
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

/// Load a project into a headless session, picking the container from the
/// output extension when it names one.
fn open_session(
    project: &Path,
    output: &Path,
    mut config: EngineConfig,
) -> Result<EditorSession<HeadlessSurface>> {
    if let Some(container) = output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<Container>().ok())
    {
        config.export_container = container;
    }
    let file = ProjectFile::load_from_file(project)
        .with_context(|| format!("loading {}", project.display()))?;
    let surface = HeadlessSurface::new(config.canvas);
    let mut session = EditorSession::new(config, surface);
    session.load_project(file.project)?;
    Ok(session)
}

fn group_files(files: &[String]) -> Result<Vec<(String, Vec<String>)>> {
    let groups = group_by_name(files);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let names = match ChatNamingService::new(ChatNamingConfig::from_env()) {
        Ok(service) => runtime.block_on(name_groups(&service, &groups)),
        Err(e) => {
            warn!(error = %e, "Naming service unavailable; using file-name keywords");
            runtime.block_on(name_groups(&KeywordNamingService::new(), &groups))
        }
    };
    Ok(names.into_iter().zip(groups).collect())
}

/// Human-readable summary of a project.
pub fn describe(project: &Project) -> String {
    let mut out = String::new();
    let registry = &project.registry;
    let _ = writeln!(
        out,
        "{} ({} ms, background {})",
        project.name,
        registry.max_time(),
        project.background_color
    );
    for timeline in registry.timelines() {
        let marker = if registry.active_id() == Some(timeline.id) { "*" } else { " " };
        let _ = writeln!(out, "{marker} {} [{} elements]", timeline.name, timeline.elements.len());
        for element in &timeline.elements {
            let detail = match &element.kind {
                ElementKind::Text(props) => format!("{:?}", props.text),
                other => other.source().map(|s| s.url.clone()).unwrap_or_default(),
            };
            let _ = writeln!(
                out,
                "    {:?} {} {} {}",
                element.element_type(),
                element.time_frame,
                element.name,
                detail
            );
        }
    }
    if !project.animations.is_empty() {
        let _ = writeln!(out, "animations: {}", project.animations.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_core::TimeFrame;
    use reel_timeline::{EditorElement, MediaSource};

    fn parse(list: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("reel").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_commands() {
        let cli = parse(&["--config", "c.json", "info", "p.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert_eq!(
            cli.command,
            Command::Info {
                project: PathBuf::from("p.json")
            }
        );

        // The config flag is global and may follow the subcommand.
        let cli = parse(&["new", "p.json", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert_eq!(
            cli.command,
            Command::New {
                project: PathBuf::from("p.json"),
                name: "Untitled".into()
            }
        );

        let cli = parse(&["group", "a.mp4", "b.mp4"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Group {
                files: vec!["a.mp4".into(), "b.mp4".into()]
            }
        );

        let cli = parse(&["export-args", "p.json", "out.webm"]).unwrap();
        assert!(matches!(cli.command, Command::ExportArgs { .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["export", "p.json"]).is_err());
        assert!(parse(&["group"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["--config"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        let command = Cli::command();
        command.clone().debug_assert();

        let export = command.find_subcommand("export").unwrap();
        let about = export.get_about().unwrap().to_string();
        assert!(about.contains("background"));
    }

    #[test]
    fn test_describe_lists_elements() {
        let mut project = Project::new("Demo");
        project.registry.add_element(EditorElement::video(
            "beach.mp4",
            MediaSource::new("/media/beach.mp4"),
            TimeFrame::new(0, 4000),
        ));
        let text = describe(&project);
        assert!(text.starts_with("Demo (4000 ms"));
        assert!(text.contains("* Timeline 1 [1 elements]"));
        assert!(text.contains("Video [0ms, 4000ms] beach.mp4 /media/beach.mp4"));
    }

    #[test]
    fn test_export_args_pick_container_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        let mut project = Project::new("Demo");
        project.registry.add_element(EditorElement::video(
            "v",
            MediaSource::new("v.mp4"),
            TimeFrame::new(0, 1000),
        ));
        ProjectFile::new(project).save_to_file(&path).unwrap();

        let out = dir.path().join("out.webm");
        let session = open_session(&path, &out, EngineConfig::default()).unwrap();
        let job = session.export_job(&out);
        assert_eq!(job.container, Container::Webm);
        assert_eq!(job.duration_ms, 1000);
    }
}
