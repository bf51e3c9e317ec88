// ==========================================
// 期刊文章导入 - 目标出版系统协作接口
// ==========================================
// 职责: 定义导入核心所需的数据访问接口（不包含业务逻辑）
// 实现者: SqlitePublishingStore（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{
    Author, Galley, Genre, Issue, Journal, LocalizedText, Publication, Role, Section, Submission,
    SubmissionFile, User, WorkflowStage,
};
use crate::repository::error::RepositoryResult;
use std::path::Path;

// ==========================================
// ContextRepository - 期刊/用户/角色查询
// ==========================================
pub trait ContextRepository {
    /// 按 URL 路径查找期刊
    fn find_journal_by_path(&self, path: &str) -> RepositoryResult<Option<Journal>>;

    /// 按用户名查找用户
    fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    /// 查找期刊内某角色的用户组，且该组被分配到指定工作流阶段
    ///
    /// # 返回
    /// - Ok(Some(id)): 第一个满足条件的用户组
    /// - Ok(None): 不存在
    fn find_user_group_for_stage(
        &self,
        context_id: i64,
        role: Role,
        stage: WorkflowStage,
    ) -> RepositoryResult<Option<i64>>;

    /// 查找期刊内某角色的第一个用户组
    fn find_first_user_group(&self, context_id: i64, role: Role) -> RepositoryResult<Option<i64>>;

    /// 按键查找文件分类（genre）
    fn find_genre_by_key(&self, context_id: i64, key: &str) -> RepositoryResult<Option<Genre>>;
}

// ==========================================
// IssueRepository - 期
// ==========================================
pub trait IssueRepository {
    /// 按 (期刊, 卷, 期号) 查找期
    fn find_issue(
        &self,
        context_id: i64,
        volume: &str,
        number: &str,
    ) -> RepositoryResult<Option<Issue>>;

    /// 插入期，返回新 ID
    fn insert_issue(&self, issue: &Issue) -> RepositoryResult<i64>;

    /// 更新期的封面（locale → 公共文件名）
    fn update_issue_cover(&self, issue_id: i64, cover: &LocalizedText) -> RepositoryResult<()>;

    fn delete_issue(&self, issue_id: i64) -> RepositoryResult<()>;

    /// 读取期刊所有已发布的期，按自定义顺序升序（无自定义顺序的排在最后）
    fn list_published_issues(&self, context_id: i64) -> RepositoryResult<Vec<Issue>>;

    /// 清空期刊的自定义期排序
    fn delete_custom_issue_orders(&self, context_id: i64) -> RepositoryResult<()>;

    fn insert_custom_issue_order(
        &self,
        context_id: i64,
        issue_id: i64,
        seq: i64,
    ) -> RepositoryResult<()>;

    /// 设置当前期（同时取消其他期的 current 标记）
    fn set_current_issue(&self, context_id: i64, issue_id: i64) -> RepositoryResult<()>;
}

// ==========================================
// SectionRepository - 栏目
// ==========================================
pub trait SectionRepository {
    /// 按标题与 locale 查找栏目
    fn find_section_by_title(
        &self,
        context_id: i64,
        title: &str,
        locale: &str,
    ) -> RepositoryResult<Option<Section>>;

    fn insert_section(&self, section: &Section) -> RepositoryResult<i64>;

    fn delete_section(&self, section_id: i64) -> RepositoryResult<()>;

    /// 期的自定义栏目排序中是否已有该栏目
    fn has_custom_section_order(&self, issue_id: i64, section_id: i64) -> RepositoryResult<bool>;

    fn insert_custom_section_order(
        &self,
        issue_id: i64,
        section_id: i64,
        seq: i64,
    ) -> RepositoryResult<()>;
}

// ==========================================
// SubmissionRepository - 提交/出版物/作者/galley
// ==========================================
pub trait SubmissionRepository {
    /// 期刊内是否已有提交的出版物带有该公共标识符
    fn submission_exists_by_pub_id(
        &self,
        context_id: i64,
        pub_id_type: &str,
        value: &str,
    ) -> RepositoryResult<bool>;

    fn insert_submission(&self, submission: &Submission) -> RepositoryResult<i64>;

    /// 回写提交的当前出版物
    fn update_current_publication(
        &self,
        submission_id: i64,
        publication_id: i64,
    ) -> RepositoryResult<()>;

    /// 删除提交（级联删除出版物、作者、关键词、galley、文件、阶段指派）
    fn delete_submission(&self, submission_id: i64) -> RepositoryResult<()>;

    /// 插入出版物（含公共标识符），返回新 ID
    fn insert_publication(&self, publication: &Publication) -> RepositoryResult<i64>;

    /// 按 ID 整体更新出版物（含公共标识符）
    fn update_publication(&self, publication: &Publication) -> RepositoryResult<()>;

    fn find_publication(&self, publication_id: i64) -> RepositoryResult<Option<Publication>>;

    fn insert_author(&self, author: &Author) -> RepositoryResult<i64>;

    fn list_authors(&self, publication_id: i64) -> RepositoryResult<Vec<Author>>;

    /// 写入某 locale 的关键词（覆盖原有）
    fn replace_keywords(
        &self,
        publication_id: i64,
        locale: &str,
        keywords: &[String],
    ) -> RepositoryResult<()>;

    fn insert_galley(&self, galley: &Galley) -> RepositoryResult<i64>;

    /// 关联 galley 与其提交文件
    fn update_galley_file(&self, galley_id: i64, submission_file_id: i64) -> RepositoryResult<()>;

    /// 将用户以某用户组身份分配到提交的工作流阶段
    fn assign_stage(
        &self,
        submission_id: i64,
        user_group_id: i64,
        user_id: i64,
        stage: WorkflowStage,
    ) -> RepositoryResult<()>;
}

// ==========================================
// FileRepository - 文件存储
// ==========================================
pub trait FileRepository {
    /// 复制源文件到提交文件区并登记，返回新 ID
    ///
    /// # 参数
    /// - source: 源文件路径
    /// - file: 文件元数据（stored_path/file_size 由实现填写）
    fn store_submission_file(&self, source: &Path, file: &SubmissionFile)
        -> RepositoryResult<i64>;

    /// 以内存内容写入提交文件区并登记（例如改写过的 HTML）
    fn store_submission_file_content(
        &self,
        content: &[u8],
        extension: &str,
        file: &SubmissionFile,
    ) -> RepositoryResult<i64>;

    /// 复制文件到期刊公共文件区，返回最终文件名
    fn store_public_file(
        &self,
        context_id: i64,
        source: &Path,
        target_name: &str,
    ) -> RepositoryResult<String>;

    /// 删除公共文件区中的文件（文件不存在视为成功）
    fn delete_public_file(&self, context_id: i64, name: &str) -> RepositoryResult<()>;
}

// ==========================================
// PublishingStore - 导入核心使用的组合接口
// ==========================================
pub trait PublishingStore:
    ContextRepository + IssueRepository + SectionRepository + SubmissionRepository + FileRepository
{
}

impl<T> PublishingStore for T where
    T: ContextRepository
        + IssueRepository
        + SectionRepository
        + SubmissionRepository
        + FileRepository
{
}
