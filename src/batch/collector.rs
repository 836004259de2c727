//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的输出文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - 通配模式匹配（默认 `*.log`）
//! - 递归目录搜索
//! - 结果按路径排序，批次内处理顺序可复现
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `walkdir` 遍历目录

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<String>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器，默认匹配 Gaussian 输出文件
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec!["*.log".to_string(), "*.out".to_string()],
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.patterns.is_empty() {
            self.patterns = vec!["*.log".to_string()];
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 检查输入是否为目录
    pub fn is_directory(&self) -> bool {
        self.input.is_dir()
    }

    /// 收集所有匹配的文件，按路径排序
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches_patterns(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// 检查文件是否匹配任一模式
    fn matches_patterns(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        self.patterns
            .iter()
            .any(|pattern| Self::glob_match(pattern, filename))
    }

    /// 简单 glob 匹配（支持 * 和 ? 通配符）
    fn glob_match(pattern: &str, text: &str) -> bool {
        let pattern = pattern.as_bytes();
        let text = text.as_bytes();

        let mut p = 0;
        let mut t = 0;
        let mut star_p = None;
        let mut star_t = 0;

        while t < text.len() {
            if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
                p += 1;
                t += 1;
            } else if p < pattern.len() && pattern[p] == b'*' {
                star_p = Some(p);
                star_t = t;
                p += 1;
            } else if let Some(sp) = star_p {
                p = sp + 1;
                star_t += 1;
                t = star_t;
            } else {
                return false;
            }
        }

        while p < pattern.len() && pattern[p] == b'*' {
            p += 1;
        }

        p == pattern.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(FileCollector::glob_match("*.log", "h2o_opt.log"));
        assert!(FileCollector::glob_match("*.fchk", "c6h6_anion.fchk"));
        assert!(!FileCollector::glob_match("*.log", "h2o.fchk"));
        assert!(FileCollector::glob_match("isomer?.log", "isomer1.log"));
        assert!(!FileCollector::glob_match("isomer?.log", "isomer12.log"));
        assert!(FileCollector::glob_match("au20*", "au20_td.log"));
    }

    #[test]
    fn test_default_patterns_cover_log_and_out() {
        let collector = FileCollector::new(PathBuf::from("."));
        assert!(collector.matches_patterns(Path::new("a/b/job.log")));
        assert!(collector.matches_patterns(Path::new("a/b/job.out")));
        assert!(!collector.matches_patterns(Path::new("a/b/job.chk")));
    }

    #[test]
    fn test_with_pattern_splits_and_trims() {
        let collector =
            FileCollector::new(PathBuf::from(".")).with_pattern(" *.log , *.fchk ");
        assert!(collector.matches_patterns(Path::new("x.log")));
        assert!(collector.matches_patterns(Path::new("x.fchk")));
        assert!(!collector.matches_patterns(Path::new("x.out")));
    }
}
