//! 人物目录模块
//!
//! # 设计思路
//!
//! 静态、只读的人物列表，每项包含 `id`、展示名与参考图地址。
//! 生成时只使用展示名，参考图地址供界面展示。
//!
//! # 实现思路
//!
//! - 列表以 `&'static` 常量切片保存，编译期确定。
//! - `id` 索引在首次查询时构建（`Lazy<HashMap>`）。
//! - `Persona::from_name` 按“小写 + 空白折叠为 `-`”生成 id，便于追加条目，
//!   也用于目录之外的自定义人物。
//! - 下载文件名沿用同一规则：`face-transform-<slug>.png`。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// 可选人物。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

impl Persona {
    /// 由展示名生成条目。
    ///
    /// # 示例
    /// ```rust
    /// use celebrity_selfie::persona::Persona;
    ///
    /// let p = Persona::from_name("CEO  Tim Cook", "/tim.jpg");
    /// assert_eq!(p.id, "ceo-tim-cook");
    /// ```
    pub fn from_name(name: &str, image_url: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            image_url: image_url.to_string(),
        }
    }

    /// 合影的默认下载文件名。
    ///
    /// ```rust
    /// use celebrity_selfie::persona;
    ///
    /// let p = persona::find("nani").unwrap();
    /// assert_eq!(p.download_filename(), "face-transform-tollywood-hero-nani.png");
    /// ```
    pub fn download_filename(&self) -> String {
        format!("face-transform-{}.png", slugify(&self.name))
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// 没有参考图的人物使用的占位图。
pub const PLACEHOLDER_IMAGE_URL: &str = "/placeholder.svg";

const PLACEHOLDER: &str = PLACEHOLDER_IMAGE_URL;

// (id, 展示名, 参考图)
const CATALOG: &[(&str, &str, &str)] = &[
    // Tollywood Heroines
    ("sreelela", "Tollywood Heroine Sreelela", "/tolliwoodheroine-sreelela-actress-portrait.jpg"),
    ("samantha", "Tollywood Heroine Samantha Ruth Prabhu", PLACEHOLDER),
    ("rashmika-mandanna", "Tollywood Heroine Rashmika Mandanna", PLACEHOLDER),
    ("pooja-hegde", "Tollywood Heroine Pooja Hegde", PLACEHOLDER),
    ("kajal-aggarwal", "Tollywood Heroine Kajal Aggarwal", PLACEHOLDER),
    ("anushka-shetty", "Tollywood Heroine Anushka Shetty", PLACEHOLDER),
    ("keerthy-suresh", "Tollywood Heroine Keerthy Suresh", PLACEHOLDER),
    ("sai-pallavi", "Tollywood Heroine Sai Pallavi", PLACEHOLDER),
    ("nithya-menen", "Tollywood Heroine Nithya Menen", PLACEHOLDER),
    ("tamannaah", "Tollywood Heroine Tamannaah Bhatia", PLACEHOLDER),
    ("shruti-haasan", "Tollywood Heroine Shruti Haasan", PLACEHOLDER),
    ("rakul-preet", "Tollywood Heroine Rakul Preet Singh", PLACEHOLDER),
    ("mehreen-pirzada", "Tollywood Heroine Mehreen Pirzada", PLACEHOLDER),
    ("raashi-khanna", "Tollywood Heroine Raashi Khanna", PLACEHOLDER),
    ("lavanya-tripathi", "Tollywood Heroine Lavanya Tripathi", PLACEHOLDER),
    ("regina-cassandra", "Tollywood Heroine Regina Cassandra", PLACEHOLDER),
    ("nabha-natesh", "Tollywood Heroine Nabha Natesh", PLACEHOLDER),
    ("krithi-shetty", "Tollywood Heroine Krithi Shetty", PLACEHOLDER),
    ("mrunal-thakur", "Tollywood Heroine Mrunal Thakur", PLACEHOLDER),
    ("sree-leela", "Tollywood Heroine Sree Leela", PLACEHOLDER),
    // Tollywood Heroes
    ("srikanth", "Tollywood Hero Srikanth", "/tolliwoodhero-srikanth-actor-portrait.jpg"),
    ("allu-arjun", "Tollywood Hero Allu Arjun", "/tolliwoodhero-allu-arjun-portrait.png"),
    ("prabhas", "Tollywood Hero Prabhas", "/tolliwoodhero-prabhas-actor-portrait.jpg"),
    ("mahesh-babu", "Tollywood Hero Mahesh Babu", PLACEHOLDER),
    ("jr-ntr", "Tollywood Hero Jr NTR", PLACEHOLDER),
    ("ram-charan", "Tollywood Hero Ram Charan", PLACEHOLDER),
    ("vijay-deverakonda", "Tollywood Hero Vijay Deverakonda", PLACEHOLDER),
    ("nani", "Tollywood Hero Nani", "/tolliwoodhero-nani-actor-portrait.jpg"),
    ("chiranjeevi", "Tollywood Hero Chiranjeevi", "/tolliwoodhero-chiranjeevi-actor-portrait.jpg"),
    ("naga-chaitanya", "Tollywood Hero Naga Chaitanya", PLACEHOLDER),
    ("ravi-teja", "Tollywood Hero Ravi Teja", PLACEHOLDER),
    ("nithiin", "Tollywood Hero Nithiin", PLACEHOLDER),
    ("ram-pothineni", "Tollywood Hero Ram Pothineni", PLACEHOLDER),
    ("sharwanand", "Tollywood Hero Sharwanand", PLACEHOLDER),
    ("sai-dharam-tej", "Tollywood Hero Sai Dharam Tej", PLACEHOLDER),
    ("varun-tej", "Tollywood Hero Varun Tej", PLACEHOLDER),
    ("bellamkonda-sreenivas", "Tollywood Hero Bellamkonda Sreenivas", PLACEHOLDER),
    ("gopichand", "Tollywood Hero Gopichand", PLACEHOLDER),
    ("naveen-polishetty", "Tollywood Hero Naveen Polishetty", PLACEHOLDER),
    ("nikhil-siddharth", "Tollywood Hero Nikhil Siddharth", PLACEHOLDER),
    ("sudheer-babu", "Tollywood Hero Sudheer Babu", PLACEHOLDER),
    ("adivi-sesh", "Tollywood Hero Adivi Sesh", PLACEHOLDER),
    ("vishwak-sen", "Tollywood Hero Vishwak Sen", PLACEHOLDER),
    ("kartikeya", "Tollywood Hero Kartikeya Gummakonda", PLACEHOLDER),
    ("santhanam", "Tollywood Hero Santhanam", PLACEHOLDER),
    // CEOs
    ("satya-nadella", "CEO Satya Nadella", "/MS-Exec-Nadella-Satya-2017-08-31-22_(cropped).jpg"),
    ("sundar-pichai", "CEO Sundar Pichai", "/Sundar_Pichai_-_2023_(cropped).jpg"),
    ("tim-cook", "CEO Tim Cook", PLACEHOLDER),
];

static PERSONAS: Lazy<Vec<Persona>> = Lazy::new(|| {
    CATALOG
        .iter()
        .map(|(id, name, image_url)| Persona {
            id: id.to_string(),
            name: name.to_string(),
            image_url: image_url.to_string(),
        })
        .collect()
});

static INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    CATALOG
        .iter()
        .enumerate()
        .map(|(idx, (id, _, _))| (*id, idx))
        .collect()
});

/// 全部人物（按目录顺序）。
pub fn all() -> &'static [Persona] {
    &PERSONAS
}

/// 按 id 查找。
pub fn find(id: &str) -> Option<&'static Persona> {
    INDEX.get(id.trim()).and_then(|idx| PERSONAS.get(*idx))
}
