// ==========================================
// 校务排课系统 - 师资主数据领域模型
// ==========================================
// 红线: 主数据由外部校务模块维护，本核心只读，不得反向写入
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// Teacher - 教师
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: String,   // 教师ID
    pub name: String,         // 姓名
    pub weekly_capacity: i32, // 周课时上限（节）
    pub active: bool,         // 在职标志
}

// ==========================================
// Subject - 科目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String, // 科目ID
    pub name: String,       // 科目名称
    pub weekly_hours: i32,  // 每班默认周课时（节）
}

// ==========================================
// SchoolClass - 班级
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolClass {
    pub class_id: String, // 班级ID
    pub grade: String,    // 年级
    // 按科目覆盖的周课时表 (subject_id -> 节数)；缺省回落到 Subject.weekly_hours
    pub subject_hours: HashMap<String, i32>,
}

impl SchoolClass {
    /// 计算该班级某科目的实际周课时
    ///
    /// 班级级覆盖优先，未配置则使用科目默认值
    pub fn effective_hours(&self, subject: &Subject) -> i32 {
        self.subject_hours
            .get(&subject.subject_id)
            .copied()
            .unwrap_or(subject.weekly_hours)
    }
}

// ==========================================
// RosterIndex - 师资名称索引
// ==========================================
// 用途: 应急课表/补课日落库时冗余展示名称，
//       下游展示方无需再回查师资主数据
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    teacher_names: HashMap<String, String>,
    subject_names: HashMap<String, String>,
    class_names: HashMap<String, String>,
    class_grades: HashMap<String, String>,
}

impl RosterIndex {
    /// 从师资主数据构建索引
    pub fn build(teachers: &[Teacher], subjects: &[Subject], classes: &[SchoolClass]) -> Self {
        let mut index = RosterIndex::default();
        for t in teachers {
            index
                .teacher_names
                .insert(t.teacher_id.clone(), t.name.clone());
        }
        for s in subjects {
            index
                .subject_names
                .insert(s.subject_id.clone(), s.name.clone());
        }
        for c in classes {
            // 班级展示名直接使用 class_id（外部模块无独立名称字段）
            index.class_names.insert(c.class_id.clone(), c.class_id.clone());
            index.class_grades.insert(c.class_id.clone(), c.grade.clone());
        }
        index
    }

    pub fn teacher_name(&self, teacher_id: &str) -> Option<&str> {
        self.teacher_names.get(teacher_id).map(|s| s.as_str())
    }

    pub fn subject_name(&self, subject_id: &str) -> Option<&str> {
        self.subject_names.get(subject_id).map(|s| s.as_str())
    }

    pub fn class_name(&self, class_id: &str) -> Option<&str> {
        self.class_names.get(class_id).map(|s| s.as_str())
    }

    pub fn class_grade(&self, class_id: &str) -> Option<&str> {
        self.class_grades.get(class_id).map(|s| s.as_str())
    }

    /// 校验一个槽位引用的教师/科目/班级是否全部可解析
    pub fn has_context(&self, teacher_id: &str, subject_id: &str, class_id: &str) -> bool {
        self.teacher_names.contains_key(teacher_id)
            && self.subject_names.contains_key(subject_id)
            && self.class_names.contains_key(class_id)
    }
}
