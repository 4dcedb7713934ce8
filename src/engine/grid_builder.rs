// ==========================================
// 校务排课系统 - 排课生成引擎
// ==========================================
// 算法: 随机构造 + 有界重试，非精确求解
// 红线: 容量校验先行（需求超过格子总数立即失败，不做任何落位尝试）
// 红线: 单科排不满是可恢复冲突，随部分课表一并返回，由调用方定夺
// ==========================================

use crate::config::ScheduleConfig;
use crate::domain::roster::{SchoolClass, Subject, Teacher};
use crate::domain::schedule::{ScheduleGrid, ScheduleSlot};
use crate::domain::types::ConflictKind;
use crate::engine::error::{EngineError, EngineResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

// ==========================================
// ScheduleConflict - 排课冲突
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub kind: ConflictKind,  // 冲突类型
    pub class_id: String,    // 班级
    pub subject_id: String,  // 科目
    pub missing_hours: i32,  // 未排满的课时数
    pub message: String,     // 说明（展示用）
}

/// 排课结果: 课表（可能不完整）+ 冲突列表
#[derive(Debug, Clone)]
pub struct GridBuildResult {
    pub grid: ScheduleGrid,
    pub conflicts: Vec<ScheduleConflict>,
}

// ==========================================
// TeacherEligibility - 教师任课资格钩子
// ==========================================
// 现状: 任何教师可被排到任何科目（外部校务模块没有任课资格数据）。
// 这里保留显式扩展点，资格数据就绪后替换实现即可，调用方不受影响。
pub trait TeacherEligibility {
    fn eligible(&self, teacher: &Teacher, subject_id: &str) -> bool;
}

/// 默认资格策略: 任何教师可教任何科目
pub struct AnyTeacher;

impl TeacherEligibility for AnyTeacher {
    fn eligible(&self, _teacher: &Teacher, _subject_id: &str) -> bool {
        true
    }
}

// ==========================================
// SlotPlacer - 落位策略接口
// ==========================================
// 稳定面是输入/输出契约；随机构造可被精确求解器（如图着色/整数规划）
// 替换而不触动调用方

/// 单个 (班级, 科目) 的排课需求
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub class_id: String,
    pub subject_id: String,
    pub hours: i32,        // 需排课时数
    pub max_attempts: u32, // 重试上限
}

/// 落位上下文（策略的只读环境）
pub struct PlacementContext<'a> {
    pub teachers: &'a [Teacher],                  // 候选教师（已过滤在职）
    pub eligibility: &'a dyn TeacherEligibility,  // 任课资格钩子
    pub days_per_week: u32,
    pub periods_per_day: u32,
    pub anti_consecutive: bool,
}

/// 落位策略
pub trait SlotPlacer {
    /// 尝试为一个需求落位，返回实际排入的课时数
    ///
    /// 策略只能通过合法性检查追加槽位，不得移动或删除已有槽位
    fn place(
        &mut self,
        grid: &mut ScheduleGrid,
        request: &PlacementRequest,
        ctx: &PlacementContext<'_>,
    ) -> i32;
}

// ==========================================
// RandomPlacer - 随机落位策略
// ==========================================
pub struct RandomPlacer<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomPlacer<R> {
    /// 用外部随机源构造（测试用 SmallRng::seed_from_u64 保证可复现）
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPlacer<rand::rngs::ThreadRng> {
    /// 默认随机源
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for RandomPlacer<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SlotPlacer for RandomPlacer<R> {
    fn place(
        &mut self,
        grid: &mut ScheduleGrid,
        request: &PlacementRequest,
        ctx: &PlacementContext<'_>,
    ) -> i32 {
        if ctx.teachers.is_empty() {
            return 0;
        }

        let mut placed = 0;
        let mut attempts = 0;

        while placed < request.hours && attempts < request.max_attempts {
            attempts += 1;

            let teacher = &ctx.teachers[self.rng.random_range(0..ctx.teachers.len())];
            let day = self.rng.random_range(0..ctx.days_per_week);
            let period = self.rng.random_range(0..ctx.periods_per_day);

            // (a) 班级该格必须为空
            if grid.class_cell(&request.class_id, day, period).is_some() {
                continue;
            }
            // (b) 教师该格必须空闲
            if grid.teacher_busy(&teacher.teacher_id, day, period) {
                continue;
            }
            // (c) 防连堂: 相邻节次不排同一科目
            if ctx.anti_consecutive
                && grid.adjacent_same_subject(&request.class_id, &request.subject_id, day, period)
            {
                continue;
            }
            // (d) 任课资格钩子（默认放行）
            if !ctx.eligibility.eligible(teacher, &request.subject_id) {
                continue;
            }

            grid.slots.push(ScheduleSlot {
                day,
                period,
                teacher_id: teacher.teacher_id.clone(),
                subject_id: request.subject_id.clone(),
                class_id: request.class_id.clone(),
            });
            placed += 1;
        }

        placed
    }
}

// ==========================================
// GridBuilder - 排课生成引擎
// ==========================================
pub struct GridBuilder<P: SlotPlacer> {
    placer: P,
    eligibility: Box<dyn TeacherEligibility>,
}

impl GridBuilder<RandomPlacer<rand::rngs::ThreadRng>> {
    /// 默认构造: 随机落位 + 任意任课资格
    pub fn new() -> Self {
        Self {
            placer: RandomPlacer::new(),
            eligibility: Box::new(AnyTeacher),
        }
    }
}

impl Default for GridBuilder<RandomPlacer<rand::rngs::ThreadRng>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SlotPlacer> GridBuilder<P> {
    /// 用自定义落位策略构造
    pub fn with_placer(placer: P) -> Self {
        Self {
            placer,
            eligibility: Box::new(AnyTeacher),
        }
    }

    /// 替换任课资格钩子
    pub fn with_eligibility(mut self, eligibility: Box<dyn TeacherEligibility>) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// 生成周课表
    ///
    /// # 参数
    /// - `teachers`: 教师主数据（离职教师在此过滤）
    /// - `subjects`: 科目主数据
    /// - `classes`: 班级主数据（周课时覆盖表优先于科目默认值）
    /// - `config`: 排课参数
    ///
    /// # 返回
    /// - `Ok(GridBuildResult)`: 课表 + 冲突列表（冲突非空表示部分科目未排满）
    /// - `Err(CapacityExceeded)`: 需求课时超过格子总量，未做任何落位
    #[instrument(skip_all, fields(
        teachers = teachers.len(),
        classes = classes.len(),
        subjects = subjects.len()
    ))]
    pub fn build(
        &mut self,
        teachers: &[Teacher],
        subjects: &[Subject],
        classes: &[SchoolClass],
        config: &ScheduleConfig,
    ) -> EngineResult<GridBuildResult> {
        let active_teachers: Vec<Teacher> =
            teachers.iter().filter(|t| t.active).cloned().collect();

        // 需求清单: 每个 (班级, 科目) 一条
        let mut requests: Vec<PlacementRequest> = Vec::new();
        let max_attempts = config.attempt_multiplier * config.cells_per_class();
        for class in classes {
            for subject in subjects {
                let hours = class.effective_hours(subject);
                if hours > 0 {
                    requests.push(PlacementRequest {
                        class_id: class.class_id.clone(),
                        subject_id: subject.subject_id.clone(),
                        hours,
                        max_attempts,
                    });
                }
            }
        }

        // 容量校验先行: 需求超过格子总量直接失败
        let required: i32 = requests.iter().map(|r| r.hours).sum();
        let available = (classes.len() as i32) * (config.cells_per_class() as i32);
        if required > available {
            return Err(EngineError::CapacityExceeded {
                required,
                available,
            });
        }

        let mut grid = ScheduleGrid::new(config.days_per_week, config.periods_per_day);
        let mut conflicts = Vec::new();

        let ctx = PlacementContext {
            teachers: &active_teachers,
            eligibility: self.eligibility.as_ref(),
            days_per_week: config.days_per_week,
            periods_per_day: config.periods_per_day,
            anti_consecutive: config.anti_consecutive,
        };

        for request in &requests {
            let placed = self.placer.place(&mut grid, request, &ctx);
            if placed < request.hours {
                let missing = request.hours - placed;
                warn!(
                    class_id = %request.class_id,
                    subject_id = %request.subject_id,
                    missing,
                    "重试耗尽，课时未排满"
                );
                conflicts.push(ScheduleConflict {
                    kind: ConflictKind::NoAvailableSlots,
                    class_id: request.class_id.clone(),
                    subject_id: request.subject_id.clone(),
                    missing_hours: missing,
                    message: format!(
                        "班级 {} 科目 {} 还有 {} 节未能落位",
                        request.class_id, request.subject_id, missing
                    ),
                });
            }
        }

        info!(
            schedule_id = %grid.schedule_id,
            slots = grid.slots.len(),
            conflicts = conflicts.len(),
            "排课生成完成"
        );

        Ok(GridBuildResult { grid, conflicts })
    }
}
