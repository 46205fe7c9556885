//! # 名人合影自拍 — 命令行入口
//!
//! 命令行扮演“上传”界面：读取本地照片，按内容嗅探声明类型，
//! 走完 校验 → 归一化 → 存储 → 选人 → 生成 的完整流程，
//! 把生成的图片写到磁盘并输出 JSON 摘要。
//!
//! ```text
//! celebrity-selfie <photo-path> <persona-id> [output-path] [--settings <file>] [--profile <name>]
//! celebrity-selfie <photo-path> --persona-name <name> [output-path]
//! celebrity-selfie --list-personas
//! celebrity-selfie --init-settings <file>
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bytes::Bytes;
use celebrity_selfie::AppError;
use celebrity_selfie::camera::{CaptureSession, NoCamera};
use celebrity_selfie::collaborators::{
    BlobStorageClient, CollaboratorError, DEFAULT_GEMINI_MODEL, GeminiClient, LocalDirStorage,
    StorageClient,
};
use celebrity_selfie::flow::AcquisitionFlow;
use celebrity_selfie::image_handler::{ImageHandler, ImagePerformanceProfile, UploadedFile};
use celebrity_selfie::persona::{self, Persona};
use celebrity_selfie::settings::AppSettings;
use serde_json::json;

const USAGE: &str = "用法: celebrity-selfie <photo-path> <persona-id> [output-path] [--settings <file>] [--profile quality|balanced|speed]
      celebrity-selfie <photo-path> --persona-name <name> [output-path]
      celebrity-selfie --list-personas
      celebrity-selfie --init-settings <file>";

/// 人物来源：目录 id 或自定义展示名。
#[derive(Debug, PartialEq, Eq)]
enum PersonaChoice {
    Catalog(String),
    Custom(String),
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    photo: PathBuf,
    persona: PersonaChoice,
    output: Option<PathBuf>,
    settings: Option<PathBuf>,
    profile: Option<ImagePerformanceProfile>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    ListPersonas,
    InitSettings(PathBuf),
    Run(RunArgs),
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
    what: &str,
) -> Result<&'a String, AppError> {
    iter.next()
        .ok_or_else(|| AppError::Usage(format!("{} 需要{}", flag, what)))
}

fn parse_args(args: &[String]) -> Result<Command, AppError> {
    let mut positional = Vec::new();
    let mut settings = None;
    let mut profile = None;
    let mut persona_name = None;
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--list-personas" => return Ok(Command::ListPersonas),
            "--init-settings" => {
                let path = flag_value(&mut iter, "--init-settings", "一个文件路径")?;
                return Ok(Command::InitSettings(PathBuf::from(path)));
            }
            "--settings" => {
                settings = Some(PathBuf::from(flag_value(&mut iter, "--settings", "一个文件路径")?));
            }
            "--profile" => {
                let name = flag_value(&mut iter, "--profile", "档位名称")?;
                let parsed = ImagePerformanceProfile::from_str(name)
                    .map_err(|e| AppError::Usage(e.to_string()))?;
                profile = Some(parsed);
            }
            "--persona-name" => {
                persona_name = Some(flag_value(&mut iter, "--persona-name", "人物名称")?.clone());
            }
            flag if flag.starts_with("--") => {
                return Err(AppError::Usage(format!("未知参数 {}", flag)));
            }
            value => positional.push(value.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let Some(photo) = positional.next() else {
        return Err(AppError::Usage("需要照片路径".to_string()));
    };
    let persona = match persona_name {
        Some(name) => PersonaChoice::Custom(name),
        None => match positional.next() {
            Some(id) => PersonaChoice::Catalog(id),
            None => return Err(AppError::Usage("需要人物 id 或 --persona-name".to_string())),
        },
    };
    let output = positional.next().map(PathBuf::from);
    if let Some(extra) = positional.next() {
        return Err(AppError::Usage(format!("多余的参数 {}", extra)));
    }

    Ok(Command::Run(RunArgs {
        photo: PathBuf::from(photo),
        persona,
        output,
        settings,
        profile,
    }))
}

/// 按配置选择存储后端：有令牌走远程对象存储，否则写本地目录。
enum SelectedStorage {
    Blob(BlobStorageClient),
    Local(LocalDirStorage),
}

impl SelectedStorage {
    fn from_settings(settings: &AppSettings) -> Result<Self, AppError> {
        match settings.blob_read_write_token.as_deref() {
            Some(token) => Ok(Self::Blob(BlobStorageClient::new(token)?)),
            None => Ok(Self::Local(LocalDirStorage::new(settings.output_dir()))),
        }
    }
}

impl StorageClient for SelectedStorage {
    async fn store(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        match self {
            Self::Blob(client) => client.store(bytes, filename, content_type).await,
            Self::Local(client) => client.store(bytes, filename, content_type).await,
        }
    }
}

/// 按内容嗅探声明类型，与浏览器 `File.type` 的角色一致。
fn declared_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}

fn default_output_path(dir: &Path, persona: &Persona) -> PathBuf {
    dir.join(persona.download_filename())
}

/// 设置文件模板：密钥留空，其余填入默认值（默认滤镜即 `speed` 档位）。
fn settings_template() -> AppSettings {
    AppSettings {
        gemini_model: Some(DEFAULT_GEMINI_MODEL.to_string()),
        image_profile: Some(ImagePerformanceProfile::Speed.as_str().to_string()),
        output_dir: Some(PathBuf::from("selfies")),
        ..Default::default()
    }
}

fn init_settings(path: &Path) -> Result<serde_json::Value, AppError> {
    if path.exists() {
        return Err(AppError::Usage(format!("设置文件已存在：{}", path.display())));
    }
    settings_template().save(path)?;
    log::info!("📝 已生成设置模板：{}", path.display());
    Ok(json!({ "settings": path.display().to_string() }))
}

fn list_personas() -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(persona::all())
        .map_err(|e| AppError::Usage(format!("序列化人物目录失败: {}", e)))?;
    println!("{}", json);
    Ok(())
}

async fn run(args: RunArgs) -> Result<serde_json::Value, AppError> {
    let settings = AppSettings::load(args.settings.as_deref())?;
    let handler = ImageHandler::new(settings.image_config()?)?;
    if let Some(profile) = args.profile {
        handler.set_performance_profile(profile)?;
    }
    log::info!("⚙️ 图片档位：{}", handler.get_performance_profile()?.as_str());
    let api_key = settings
        .gemini_api_key
        .as_deref()
        .ok_or(CollaboratorError::MissingCredential("GEMINI_API_KEY"))?;
    let generator = GeminiClient::new(api_key, settings.gemini_model())?;
    let storage = SelectedStorage::from_settings(&settings)?;

    let bytes = std::fs::read(&args.photo)?;
    let name = args
        .photo
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    let file = UploadedFile::new(name, declared_type(&bytes), bytes);
    log::info!("📂 读取照片 {}（{}，{} bytes）", args.photo.display(), file.declared_type, file.size());

    let mut flow = AcquisitionFlow::new(handler, CaptureSession::new(NoCamera), storage, generator);
    flow.open_upload()?;
    flow.submit_upload(file).await?;
    let persona = match &args.persona {
        PersonaChoice::Catalog(id) => flow.select_persona(id)?,
        PersonaChoice::Custom(name) => flow.select_custom_persona(name)?,
    }
    .clone();
    let outcome = flow.generate().await?.clone();

    let image_bytes = outcome.image.decode_bytes()?;
    let output = match args.output {
        Some(path) => path,
        None => default_output_path(&settings.output_dir(), &persona),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, &image_bytes)?;
    log::info!("✅ 合影已保存：{}", output.display());

    let user_image = flow.user_image();
    Ok(json!({
        "persona": persona,
        "userImage": user_image.map(|img| json!({
            "width": img.width(),
            "height": img.height(),
            "byteSize": img.byte_size(),
            "encodedBytes": img.encoded_image().decoded_len(),
            "remoteUrl": img.remote_url(),
        })),
        "output": output.display().to_string(),
        "message": outcome.message,
    }))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let result = match parse_args(&args) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(Command::ListPersonas) => list_personas().map(|_| None),
        Ok(Command::InitSettings(path)) => init_settings(&path).map(Some),
        Ok(Command::Run(run_args)) => run(run_args).await.map(Some),
        Err(err) => Err(err),
    };

    match result {
        Ok(Some(summary)) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            if matches!(err, AppError::Usage(_)) {
                eprintln!("{}", USAGE);
            }
            println!(
                "{}",
                json!({
                    "error": err,
                    "code": err.code(),
                    "remediation": err.remediation(),
                })
            );
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use celebrity_selfie::image_handler::ImageConfig;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("celebrity-selfie")
            .chain(items.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_positional_arguments_and_settings_flag() {
        let command = parse_args(&argv(&["me.jpg", "nani", "--settings", "cfg.json"]))
            .expect("parse failed");
        assert_eq!(
            command,
            Command::Run(RunArgs {
                photo: PathBuf::from("me.jpg"),
                persona: PersonaChoice::Catalog("nani".to_string()),
                output: None,
                settings: Some(PathBuf::from("cfg.json")),
                profile: None,
            })
        );
    }

    #[test]
    fn persona_name_and_profile_flags_are_parsed() {
        let command = parse_args(&argv(&[
            "me.jpg",
            "--persona-name",
            "CEO Jensen Huang",
            "out.png",
            "--profile",
            "speed",
        ]))
        .expect("parse failed");
        assert_eq!(
            command,
            Command::Run(RunArgs {
                photo: PathBuf::from("me.jpg"),
                persona: PersonaChoice::Custom("CEO Jensen Huang".to_string()),
                output: Some(PathBuf::from("out.png")),
                settings: None,
                profile: Some(ImagePerformanceProfile::Speed),
            })
        );

        assert!(matches!(
            parse_args(&argv(&["me.jpg", "nani", "--profile", "turbo"])),
            Err(AppError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&argv(&["me.jpg", "--persona-name"])),
            Err(AppError::Usage(_))
        ));
    }

    #[test]
    fn list_flag_wins_and_missing_arguments_are_reported() {
        assert_eq!(
            parse_args(&argv(&["--list-personas"])).expect("parse failed"),
            Command::ListPersonas
        );
        assert!(matches!(parse_args(&argv(&["me.jpg"])), Err(AppError::Usage(_))));
        assert_eq!(
            parse_args(&argv(&["--init-settings", "cfg.json"])).expect("parse failed"),
            Command::InitSettings(PathBuf::from("cfg.json"))
        );
        assert!(matches!(
            parse_args(&argv(&["a", "b", "c", "d"])),
            Err(AppError::Usage(_))
        ));
    }

    #[test]
    fn declared_type_comes_from_content() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
        assert_eq!(declared_type(&png_header), "image/png");
        assert_eq!(declared_type(b"plain text"), "application/octet-stream");
    }

    #[test]
    fn default_output_is_named_after_persona() {
        let nani = persona::find("nani").expect("nani should exist");
        assert_eq!(
            default_output_path(Path::new("out"), nani),
            Path::new("out").join("face-transform-tollywood-hero-nani.png")
        );
    }

    #[test]
    fn init_settings_writes_template_once() {
        let path = std::env::temp_dir().join(format!(
            "celebrity-selfie-init-{}-{}.json",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        init_settings(&path).expect("init settings failed");
        let loaded = AppSettings::from_file(&path).expect("load failed");
        let again = init_settings(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, settings_template());
        assert_eq!(
            loaded.image_config().expect("config failed").resize_filter,
            ImageConfig::default().resize_filter
        );
        assert!(matches!(again, Err(AppError::Usage(_))));
    }
}
