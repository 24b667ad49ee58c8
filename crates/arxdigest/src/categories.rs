//! Localized display names for arXiv category codes.
//!
//! The mapping is a static table covering the categories the pipeline
//! routinely sees. Localization is deterministic, order-preserving, and
//! total: unknown codes pass through unchanged rather than being dropped, so
//! the output always has the same length and index correspondence as the
//! input.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Target language for category display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
  /// English display names
  En,
  /// Simplified Chinese display names
  Zh,
}

lazy_static! {
  /// Category code -> (English name, Chinese name).
  static ref CATEGORY_NAMES: HashMap<&'static str, (&'static str, &'static str)> = {
    let mut m = HashMap::new();
    m.insert("cs.AI", ("Artificial Intelligence", "人工智能"));
    m.insert("cs.AR", ("Hardware Architecture", "硬件体系结构"));
    m.insert("cs.CC", ("Computational Complexity", "计算复杂性"));
    m.insert("cs.CE", ("Computational Engineering", "计算工程"));
    m.insert("cs.CG", ("Computational Geometry", "计算几何"));
    m.insert("cs.CL", ("Computation and Language", "计算与语言"));
    m.insert("cs.CR", ("Cryptography and Security", "密码学与安全"));
    m.insert("cs.CV", ("Computer Vision and Pattern Recognition", "计算机视觉与模式识别"));
    m.insert("cs.CY", ("Computers and Society", "计算机与社会"));
    m.insert("cs.DB", ("Databases", "数据库"));
    m.insert("cs.DC", ("Distributed Computing", "分布式计算"));
    m.insert("cs.DL", ("Digital Libraries", "数字图书馆"));
    m.insert("cs.DM", ("Discrete Mathematics", "离散数学"));
    m.insert("cs.DS", ("Data Structures and Algorithms", "数据结构与算法"));
    m.insert("cs.ET", ("Emerging Technologies", "新兴技术"));
    m.insert("cs.FL", ("Formal Languages and Automata Theory", "形式语言与自动机理论"));
    m.insert("cs.GR", ("Graphics", "图形学"));
    m.insert("cs.GT", ("Computer Science and Game Theory", "计算机科学与博弈论"));
    m.insert("cs.HC", ("Human-Computer Interaction", "人机交互"));
    m.insert("cs.IR", ("Information Retrieval", "信息检索"));
    m.insert("cs.IT", ("Information Theory", "信息论"));
    m.insert("cs.LG", ("Machine Learning", "机器学习"));
    m.insert("cs.LO", ("Logic in Computer Science", "计算机科学中的逻辑"));
    m.insert("cs.MA", ("Multiagent Systems", "多智能体系统"));
    m.insert("cs.MM", ("Multimedia", "多媒体"));
    m.insert("cs.NE", ("Neural and Evolutionary Computing", "神经与演化计算"));
    m.insert("cs.NI", ("Networking and Internet Architecture", "网络与互联网体系结构"));
    m.insert("cs.OS", ("Operating Systems", "操作系统"));
    m.insert("cs.PF", ("Performance", "性能"));
    m.insert("cs.PL", ("Programming Languages", "编程语言"));
    m.insert("cs.RO", ("Robotics", "机器人学"));
    m.insert("cs.SD", ("Sound", "声音"));
    m.insert("cs.SE", ("Software Engineering", "软件工程"));
    m.insert("cs.SI", ("Social and Information Networks", "社交与信息网络"));
    m.insert("eess.AS", ("Audio and Speech Processing", "音频与语音处理"));
    m.insert("eess.IV", ("Image and Video Processing", "图像与视频处理"));
    m.insert("eess.SP", ("Signal Processing", "信号处理"));
    m.insert("eess.SY", ("Systems and Control", "系统与控制"));
    m.insert("math.OC", ("Optimization and Control", "优化与控制"));
    m.insert("math.ST", ("Statistics Theory", "统计理论"));
    m.insert("stat.AP", ("Applications", "应用统计"));
    m.insert("stat.ME", ("Methodology", "统计方法"));
    m.insert("stat.ML", ("Machine Learning (Statistics)", "机器学习（统计）"));
    m
  };
}

/// Localizes category codes to display names in the requested language.
///
/// Pure, order-preserving mapping; unknown codes pass through unchanged, so
/// the output length always equals the input length.
pub fn localize<S: AsRef<str>>(codes: &[S], lang: Lang) -> Vec<String> {
  codes
    .iter()
    .map(|code| {
      let code = code.as_ref();
      match CATEGORY_NAMES.get(code) {
        Some((en, zh)) => match lang {
          Lang::En => (*en).to_string(),
          Lang::Zh => (*zh).to_string(),
        },
        None => code.to_string(),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_localize_known_codes() {
    let codes = ["cs.CL", "cs.CV"];
    assert_eq!(localize(&codes, Lang::En), vec![
      "Computation and Language",
      "Computer Vision and Pattern Recognition"
    ]);
    assert_eq!(localize(&codes, Lang::Zh), vec!["计算与语言", "计算机视觉与模式识别"]);
  }

  #[test]
  fn test_unknown_codes_pass_through_preserving_length() {
    let codes = ["cs.CL", "q-bio.GN", "cs.LG", "nonsense"];
    let names = localize(&codes, Lang::Zh);
    assert_eq!(names.len(), codes.len());
    assert_eq!(names[1], "q-bio.GN");
    assert_eq!(names[3], "nonsense");
    // index correspondence holds around the pass-through entries
    assert_eq!(names[0], "计算与语言");
    assert_eq!(names[2], "机器学习");
  }

  #[test]
  fn test_localize_empty() {
    let codes: [&str; 0] = [];
    assert!(localize(&codes, Lang::En).is_empty());
  }
}
